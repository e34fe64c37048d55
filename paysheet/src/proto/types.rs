//! Request and response bodies for each callable procedure.
//!
//! Requests serialize to `camelCase` and are wrapped in `{"data": ...}` by
//! [`CallableRequest`](super::CallableRequest). Responses are decoded from the
//! `result` field after key normalization, so they are declared in
//! `camelCase` too.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Stripe API version ephemeral keys are minted against.
pub const DEFAULT_STRIPE_API_VERSION: &str = "2025-08-27.basil";

/// Payment method type listed when the caller does not ask for another.
pub const DEFAULT_PAYMENT_METHOD_TYPE: &str = "card";

/// Currency used when a payment intent does not name one.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Payload for procedures that take no arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyPayload {}

/// Payload for `create-ephemeral-key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEphemeralKeyRequest<'a> {
    /// Customer the key grants access to.
    pub stripe_customer_id: &'a str,
    /// Stripe API version the client SDK speaks.
    pub api_version: &'a str,
}

/// Payload for `list-payment-methods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentMethodsRequest<'a> {
    /// Customer whose methods are listed.
    pub stripe_customer_id: &'a str,
    /// Payment method type filter (e.g. `card`).
    #[serde(rename = "type")]
    pub payment_method_type: &'a str,
}

/// Payload for `detach-payment-method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachPaymentMethodRequest<'a> {
    /// Customer the method is attached to.
    pub stripe_customer_id: &'a str,
    /// Payment method to detach.
    pub payment_method_id: &'a str,
}

/// Payload for `create-payment-intent`.
///
/// Optional fields are left out of the serialized payload when absent or
/// empty; they are never sent as empty strings.
///
/// ```rust
/// use std::num::NonZeroU64;
/// use paysheet::proto::CreatePaymentIntentRequest;
///
/// let amount = NonZeroU64::new(500).unwrap();
/// let request = CreatePaymentIntentRequest::new("S1", amount).with_description("Coffee");
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["currency"], "usd");
/// assert!(json.get("orderId").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// Shop being paid.
    pub shop_id: String,
    /// Amount in the smallest currency unit.
    pub amount_cents: NonZeroU64,
    /// ISO currency code, sent lowercased.
    #[serde(serialize_with = "serialize_lowercase")]
    pub currency: String,
    /// Description forwarded to Stripe.
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    /// Caller's order identifier.
    #[serde(skip_serializing_if = "is_blank")]
    pub order_id: Option<String>,
    /// Address the receipt is mailed to.
    #[serde(skip_serializing_if = "is_blank")]
    pub receipt_email: Option<String>,
    /// Customer to attach the intent to.
    #[serde(skip_serializing_if = "is_blank")]
    pub stripe_customer_id: Option<String>,
}

fn serialize_lowercase<S: serde::Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_lowercase())
}

#[allow(clippy::ref_option)]
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

impl CreatePaymentIntentRequest {
    /// Creates a request in the default currency with no optional fields.
    #[must_use]
    pub fn new(shop_id: impl Into<String>, amount_cents: NonZeroU64) -> Self {
        Self {
            shop_id: shop_id.into(),
            amount_cents,
            currency: DEFAULT_CURRENCY.to_owned(),
            description: None,
            order_id: None,
            receipt_email: None,
            stripe_customer_id: None,
        }
    }

    /// Sets the currency; it is stored lowercased.
    #[must_use]
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_lowercase();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the order identifier.
    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Sets the receipt email.
    #[must_use]
    pub fn with_receipt_email(mut self, receipt_email: impl Into<String>) -> Self {
        self.receipt_email = Some(receipt_email.into());
        self
    }

    /// Attaches the intent to a customer.
    #[must_use]
    pub fn with_customer(mut self, stripe_customer_id: impl Into<String>) -> Self {
        self.stripe_customer_id = Some(stripe_customer_id.into());
        self
    }
}

/// Result of `create-customer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Stripe customer id.
    #[serde(rename = "stripeCustomerId")]
    pub customer_id: String,
    /// Whether this call created the customer.
    pub created: bool,
}

/// An object an ephemeral key grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssociatedObject {
    /// Object type, e.g. `customer`.
    #[serde(rename = "type")]
    pub object_type: String,
    /// Object id.
    pub id: String,
}

/// Result of `create-ephemeral-key`.
///
/// Deliberately not `Serialize`: the secret is single-use and never stored.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralKey {
    /// Key id (`ephkey_...`).
    pub id: String,
    /// Stripe object name.
    pub object: String,
    /// Secret handed to the payment sheet.
    pub secret: String,
    /// Creation time, epoch seconds.
    pub created: i64,
    /// Whether the key belongs to live mode.
    pub livemode: bool,
    /// Expiry, epoch seconds.
    pub expires: i64,
    /// Objects the key grants access to.
    pub associated_objects: Vec<AssociatedObject>,
}

impl fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKey")
            .field("id", &self.id)
            .field("object", &self.object)
            .field("secret", &"<redacted>")
            .field("created", &self.created)
            .field("livemode", &self.livemode)
            .field("expires", &self.expires)
            .field("associated_objects", &self.associated_objects)
            .finish()
    }
}

/// Result of `get-config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeConfig {
    /// Publishable key used to initialize the client SDK.
    pub publishable_key: String,
    /// `test` or `live`, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<String>,
    /// Platform fee in basis points, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fee_bps: Option<i64>,
}

/// Card details of a saved payment method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    /// Card brand, e.g. `visa`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Expiry month as reported; not range-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<i64>,
    /// Expiry year as reported; not range-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<i64>,
    /// Last four digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
}

impl CardDetails {
    /// Short label such as `visa ••••4242`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} ••••{}",
            self.brand.as_deref().unwrap_or("Card"),
            self.last4.as_deref().unwrap_or("????")
        )
    }

    /// Expiry as `M/YYYY`, when both parts are known.
    #[must_use]
    pub fn expiry(&self) -> Option<String> {
        Some(format!("{}/{}", self.exp_month?, self.exp_year?))
    }
}

/// A saved payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Payment method id (`pm_...`).
    pub id: String,
    /// Payment method type, e.g. `card`.
    #[serde(rename = "type")]
    pub method_type: String,
    /// Present for card methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardDetails>,
}

/// Result of `list-payment-methods`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodList {
    /// Methods in server order.
    pub payment_methods: Vec<PaymentMethod>,
}

/// Result of `detach-payment-method`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachPaymentMethodResponse {
    /// Id of the method that was detached.
    pub detached_payment_method_id: String,
}

/// Result of `create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Payment intent id (`pi_...`).
    pub payment_intent_id: String,
    /// Client secret used to confirm the intent from the device.
    pub client_secret: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Platform fee taken from the amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_fee_amount: Option<i64>,
    /// Whether the intent belongs to live mode.
    pub livemode: bool,
}
