//! Checkout preparation.
//!
//! Turns a [`CheckoutRequest`] into [`PaymentSheetInitData`] ready for a
//! presenter: create (or reuse) the payment intent, assemble a fresh
//! [`PaymentSheetContext`](paysheet::sheet::PaymentSheetContext), then apply
//! the sheet options.

use paysheet::ServiceError;
use paysheet::proto::CreatePaymentIntentRequest;
use paysheet::sheet::{GooglePayConfiguration, PaymentSheetInitData};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::service::PaymentService;

/// One checkout attempt: what to charge and how to show the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Payment intent to create. Its customer is filled in at preparation.
    pub intent: CreatePaymentIntentRequest,
    /// Merchant name shown in the sheet.
    pub merchant_display_name: String,
    /// Whether delayed-notification methods are allowed. Defaults to `true`.
    pub allows_delayed_payment_methods: bool,
    /// Google Pay options.
    pub google_pay: Option<GooglePayConfiguration>,
    /// Override for the primary button label.
    pub primary_button_label: Option<String>,
    /// Client secret of an intent created earlier; reused when non-empty.
    pub existing_client_secret: Option<String>,
}

impl CheckoutRequest {
    /// Creates a request with default sheet options.
    #[must_use]
    pub fn new(intent: CreatePaymentIntentRequest, merchant_display_name: impl Into<String>) -> Self {
        Self {
            intent,
            merchant_display_name: merchant_display_name.into(),
            allows_delayed_payment_methods: true,
            google_pay: None,
            primary_button_label: None,
            existing_client_secret: None,
        }
    }

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

    /// Reuses an intent created earlier instead of creating a new one.
    #[must_use]
    pub fn with_existing_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.existing_client_secret = Some(client_secret.into());
        self
    }

    fn reusable_client_secret(&self) -> Option<&str> {
        self.existing_client_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }
}

impl PaymentService {
    /// Prepares presenter input for one checkout by `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] from intent creation or context assembly.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.prepare_checkout", skip_all, fields(customer = %customer_id, shop = %request.intent.shop_id), err)
    )]
    pub async fn prepare_checkout(
        &self,
        customer_id: &str,
        request: &CheckoutRequest,
    ) -> Result<PaymentSheetInitData, ServiceError> {
        let client_secret = if let Some(secret) = request.reusable_client_secret() {
            #[cfg(feature = "telemetry")]
            tracing::debug!("reusing existing payment intent");
            secret.to_owned()
        } else {
            let intent = request.intent.clone().with_customer(customer_id);
            self.create_payment_intent(&intent).await?.client_secret
        };

        let context = self
            .build_payment_sheet_context(customer_id, &client_secret)
            .await?;
        let mut data = context
            .into_init_data(request.merchant_display_name.clone())
            .with_delayed_payment_methods(request.allows_delayed_payment_methods);
        if let Some(google_pay) = &request.google_pay {
            data = data.with_google_pay(google_pay.clone());
        }
        if let Some(label) = &request.primary_button_label {
            data = data.with_primary_button_label(label.clone());
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use paysheet::StaticAuthProvider;
    use paysheet::sheet::GooglePayEnvironment;
    use serde_json::json;
    use std::num::NonZeroU64;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> PaymentService {
        PaymentService::new(
            ServiceConfig::new(server.uri()),
            StaticAuthProvider::signed_in("uid-1", "tok-1"),
        )
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest::new(
            CreatePaymentIntentRequest::new("S1", NonZeroU64::new(1250).unwrap()),
            "Corner Bakery",
        )
    }

    async fn mount_context(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/get-config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"publishable_key": "pk_test_abc"}
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/create-ephemeral-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {
                "id": "ephkey_1",
                "object": "ephemeral_key",
                "secret": "ek_test_1",
                "created": 1,
                "livemode": false,
                "expires": 2,
                "associated_objects": []
            }})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_prepare_creates_intent_for_customer() {
        let server = MockServer::start().await;
        mount_context(&server).await;
        Mock::given(method("POST"))
            .and(path("/create-payment-intent"))
            .and(body_json(json!({"data": {
                "shopId": "S1",
                "amountCents": 1250,
                "currency": "usd",
                "stripeCustomerId": "cus_1"
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {
                "payment_intent_id": "pi_1",
                "client_secret": "pi_1_secret",
                "amount": 1250,
                "currency": "usd",
                "application_fee_amount": 31,
                "livemode": false
            }})))
            .expect(1)
            .mount(&server)
            .await;

        let google_pay = GooglePayConfiguration {
            environment: GooglePayEnvironment::Test,
            country_code: "US".into(),
            currency_code: None,
        };
        let data = service(&server)
            .prepare_checkout(
                "cus_1",
                &request()
                    .with_delayed_payment_methods(false)
                    .with_google_pay(google_pay.clone())
                    .with_primary_button_label("Pay $12.50"),
            )
            .await
            .unwrap();

        assert_eq!(data.mode.client_secret(), "pi_1_secret");
        assert_eq!(data.publishable_key, "pk_test_abc");
        assert_eq!(data.merchant_display_name, "Corner Bakery");
        assert_eq!(data.customer.as_ref().unwrap().ephemeral_key_secret, "ek_test_1");
        assert!(!data.allows_delayed_payment_methods);
        assert_eq!(data.google_pay, Some(google_pay));
        assert_eq!(data.primary_button_label.as_deref(), Some("Pay $12.50"));
    }

    #[tokio::test]
    async fn test_prepare_reuses_existing_client_secret() {
        let server = MockServer::start().await;
        mount_context(&server).await;
        Mock::given(method("POST"))
            .and(path("/create-payment-intent"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let data = service(&server)
            .prepare_checkout("cus_1", &request().with_existing_client_secret("pi_9_secret"))
            .await
            .unwrap();
        assert_eq!(data.mode.client_secret(), "pi_9_secret");
        assert!(data.allows_delayed_payment_methods);
    }

    #[tokio::test]
    async fn test_prepare_ignores_empty_existing_secret() {
        let server = MockServer::start().await;
        mount_context(&server).await;
        Mock::given(method("POST"))
            .and(path("/create-payment-intent"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"status": "failed-precondition", "message": "Shop is not accepting payments"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = service(&server)
            .prepare_checkout("cus_1", &request().with_existing_client_secret(""))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Callable("Shop is not accepting payments".into())
        );
    }
}
