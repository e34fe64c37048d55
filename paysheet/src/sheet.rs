//! Payment-sheet data model and presenter seam.
//!
//! A [`PaymentSheetContext`] is the credential bundle assembled by the payment
//! service. It is consumed once, by value, into [`PaymentSheetInitData`],
//! which a [`PaymentSheetPresenter`] hands to the platform's native payment
//! sheet. Whatever the native SDK reports is normalized into a
//! [`PaymentSheetOutcome`].
//!
//! Native presenters live with the host application and are injected; this
//! crate only ships [`UnsupportedPlatformPresenter`] for targets without a
//! payment sheet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four credentials a payment sheet needs to render.
///
/// Not `Clone`: the ephemeral key secret is minted for a single presentation.
#[derive(PartialEq, Eq)]
pub struct PaymentSheetContext {
    /// Publishable key used to initialize the client SDK.
    pub publishable_key: String,
    /// Stripe customer id.
    pub customer_id: String,
    /// Freshly minted ephemeral key secret.
    pub ephemeral_key_secret: String,
    /// Client secret of the payment intent being confirmed.
    pub payment_intent_client_secret: String,
}

impl PaymentSheetContext {
    /// Consumes the context into presenter input with default options.
    #[must_use]
    pub fn into_init_data(self, merchant_display_name: impl Into<String>) -> PaymentSheetInitData {
        PaymentSheetInitData {
            mode: SheetMode::PaymentIntent {
                client_secret: self.payment_intent_client_secret,
            },
            publishable_key: self.publishable_key,
            merchant_display_name: merchant_display_name.into(),
            customer: Some(CustomerConfiguration {
                id: self.customer_id,
                ephemeral_key_secret: self.ephemeral_key_secret,
            }),
            allows_delayed_payment_methods: true,
            google_pay: None,
            primary_button_label: None,
        }
    }
}

impl fmt::Debug for PaymentSheetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSheetContext")
            .field("publishable_key", &key_prefix(&self.publishable_key))
            .field("customer_id", &self.customer_id)
            .field("ephemeral_key_secret", &"<redacted>")
            .field("payment_intent_client_secret", &"<redacted>")
            .finish()
    }
}

/// First eight characters of a key followed by an ellipsis, for logs.
#[must_use]
pub fn key_prefix(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{prefix}…")
}

/// Which intent the sheet confirms.
#[derive(Clone, PartialEq, Eq)]
pub enum SheetMode {
    /// Collect and confirm a payment.
    PaymentIntent {
        /// Payment intent client secret.
        client_secret: String,
    },
    /// Save a payment method for later without charging.
    SetupIntent {
        /// Setup intent client secret.
        client_secret: String,
    },
}

impl SheetMode {
    /// The client secret of either intent kind.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        match self {
            Self::PaymentIntent { client_secret } | Self::SetupIntent { client_secret } => {
                client_secret
            }
        }
    }
}

impl fmt::Debug for SheetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PaymentIntent { .. } => f.write_str("PaymentIntent(<redacted>)"),
            Self::SetupIntent { .. } => f.write_str("SetupIntent(<redacted>)"),
        }
    }
}

/// Customer the sheet shows saved payment methods for.
#[derive(Clone, PartialEq, Eq)]
pub struct CustomerConfiguration {
    /// Stripe customer id.
    pub id: String,
    /// Ephemeral key secret scoped to the customer.
    pub ephemeral_key_secret: String,
}

impl fmt::Debug for CustomerConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerConfiguration")
            .field("id", &self.id)
            .field("ephemeral_key_secret", &"<redacted>")
            .finish()
    }
}

/// Google Pay environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GooglePayEnvironment {
    /// Test environment.
    #[default]
    Test,
    /// Production environment.
    Production,
}

/// Google Pay options for sheets presented on Android.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayConfiguration {
    /// Test or production.
    pub environment: GooglePayEnvironment,
    /// ISO 3166 merchant country code.
    pub country_code: String,
    /// ISO 4217 currency code; required for setup intents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
}

/// Everything a presenter needs to show the native payment sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSheetInitData {
    /// Intent to confirm.
    pub mode: SheetMode,
    /// Publishable key used to initialize the client SDK.
    pub publishable_key: String,
    /// Merchant name shown in the sheet.
    pub merchant_display_name: String,
    /// Customer whose saved methods are offered.
    pub customer: Option<CustomerConfiguration>,
    /// Whether delayed-notification methods (e.g. bank debits) are allowed.
    pub allows_delayed_payment_methods: bool,
    /// Google Pay options.
    pub google_pay: Option<GooglePayConfiguration>,
    /// Override for the sheet's primary button label.
    pub primary_button_label: Option<String>,
}

impl PaymentSheetInitData {
    /// Sets whether delayed payment methods are allowed.
    #[must_use]
    pub const fn with_delayed_payment_methods(mut self, allowed: bool) -> Self {
        self.allows_delayed_payment_methods = allowed;
        self
    }

    /// Attaches Google Pay options.
    #[must_use]
    pub fn with_google_pay(mut self, google_pay: GooglePayConfiguration) -> Self {
        self.google_pay = Some(google_pay);
        self
    }

    /// Overrides the primary button label.
    #[must_use]
    pub fn with_primary_button_label(mut self, label: impl Into<String>) -> Self {
        self.primary_button_label = Some(label.into());
        self
    }
}

/// Normalized result of a payment-sheet presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "lowercase")]
pub enum PaymentSheetOutcome {
    /// The payment was confirmed.
    Completed,
    /// The user dismissed the sheet.
    Canceled,
    /// The sheet reported an error.
    Failed(String),
}

/// Presents the native payment sheet for one checkout.
///
/// Implement one presenter per platform SDK and inject it where checkout is
/// driven. Presentation failures, including the absence of a window to
/// present from, are reported as [`PaymentSheetOutcome::Failed`].
#[async_trait::async_trait]
pub trait PaymentSheetPresenter: Send + Sync {
    /// Shows the sheet and resolves once the user finishes with it.
    async fn present(&self, data: &PaymentSheetInitData) -> PaymentSheetOutcome;
}

/// Presenter for targets without a native payment sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatformPresenter;

impl UnsupportedPlatformPresenter {
    /// Message reported for every presentation.
    pub const MESSAGE: &'static str = "Stripe PaymentSheet is not available on this platform yet.";
}

#[async_trait::async_trait]
impl PaymentSheetPresenter for UnsupportedPlatformPresenter {
    async fn present(&self, _data: &PaymentSheetInitData) -> PaymentSheetOutcome {
        #[cfg(feature = "telemetry")]
        tracing::warn!("payment sheet requested on an unsupported platform");
        PaymentSheetOutcome::Failed(Self::MESSAGE.to_owned())
    }
}
