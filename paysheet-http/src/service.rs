//! Payment context builder.
//!
//! [`PaymentService`] sequences callable procedures into the operations a
//! payment UI needs. Every operation checks, in order and before any network
//! traffic:
//!
//! 1. a user is signed in, else [`ServiceError::NotAuthenticated`]
//! 2. the base URL is configured and valid, else [`ServiceError::MissingBaseUrl`]
//!
//! and then mints a fresh ID token for the call. Nothing is retried and
//! nothing is cached; callers re-run composite operations from scratch.

use std::sync::Arc;

use paysheet::proto::{
    CreateEphemeralKeyRequest, CreatePaymentIntentRequest, Customer, DEFAULT_PAYMENT_METHOD_TYPE,
    DetachPaymentMethodRequest, DetachPaymentMethodResponse, EmptyPayload, EphemeralKey,
    ListPaymentMethodsRequest, PaymentIntent, PaymentMethod, PaymentMethodList, Procedure,
    StripeConfig,
};
use paysheet::sheet::PaymentSheetContext;
use paysheet::{AuthProvider, AuthToken, ServiceError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::callable::CallableClient;
use crate::config::ServiceConfig;

/// Orchestrates callable procedures for payment-sheet checkout.
///
/// Holds only immutable configuration and a shared HTTP client, so clones can
/// be used concurrently from independent call sites.
///
/// # Example
///
/// ```no_run
/// use paysheet::StaticAuthProvider;
/// use paysheet_http::{PaymentService, ServiceConfig};
///
/// # async fn run() -> Result<(), paysheet::ServiceError> {
/// let service = PaymentService::new(
///     ServiceConfig::new("https://us-central1-example.cloudfunctions.net"),
///     StaticAuthProvider::signed_in("uid-1", "id-token"),
/// );
/// let customer = service.ensure_customer().await?;
/// let methods = service.list_payment_methods(&customer.customer_id).await?;
/// # let _ = methods;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PaymentService {
    client: CallableClient,
    auth: Arc<dyn AuthProvider>,
    config: ServiceConfig,
}

impl std::fmt::Debug for PaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PaymentService {
    /// Creates a service from configuration and an authentication provider.
    pub fn new(config: ServiceConfig, auth: impl AuthProvider + 'static) -> Self {
        let client = config
            .http_client
            .clone()
            .map_or_else(CallableClient::new, CallableClient::with_client);
        Self {
            client,
            auth: Arc::new(auth),
            config,
        }
    }

    /// Returns the service configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Checks the preconditions shared by every operation and mints a token.
    async fn authorize(&self) -> Result<(Url, AuthToken), ServiceError> {
        let Some(user) = self.auth.current_user() else {
            #[cfg(feature = "telemetry")]
            tracing::debug!("no signed-in user");
            return Err(ServiceError::NotAuthenticated);
        };
        let base_url = self.config.resolve_base_url()?;
        let token = user.id_token().await.map_err(|_e| {
            #[cfg(feature = "telemetry")]
            tracing::warn!(uid = user.uid(), error = %_e, "failed to mint ID token");
            ServiceError::NotAuthenticated
        })?;
        Ok((base_url, token))
    }

    /// Authorizes, then invokes one procedure.
    async fn call<P, R>(&self, procedure: Procedure, payload: &P) -> Result<R, ServiceError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let (base_url, token) = self.authorize().await?;
        self.client
            .invoke(&base_url, procedure, payload, &token)
            .await
    }

    /// Returns the Stripe customer for the signed-in user, creating it on
    /// first use. Repeated calls return the same customer; `created` tells
    /// whether this call created it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.ensure_customer", skip_all, err)
    )]
    pub async fn ensure_customer(&self) -> Result<Customer, ServiceError> {
        let customer: Customer = self
            .call(Procedure::CreateCustomer, &EmptyPayload {})
            .await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(
            customer = %customer.customer_id,
            created = customer.created,
            "customer ready"
        );
        Ok(customer)
    }

    /// Mints an ephemeral key against the configured Stripe API version.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    pub async fn create_ephemeral_key(&self, customer_id: &str) -> Result<EphemeralKey, ServiceError> {
        self.create_ephemeral_key_with_version(customer_id, &self.config.api_version)
            .await
    }

    /// Mints an ephemeral key for an explicit Stripe API version.
    ///
    /// The secret is meant for exactly one upcoming presentation.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.create_ephemeral_key", skip_all, fields(customer = %customer_id, api_version = %api_version), err)
    )]
    pub async fn create_ephemeral_key_with_version(
        &self,
        customer_id: &str,
        api_version: &str,
    ) -> Result<EphemeralKey, ServiceError> {
        let payload = CreateEphemeralKeyRequest {
            stripe_customer_id: customer_id,
            api_version,
        };
        let key: EphemeralKey = self.call(Procedure::CreateEphemeralKey, &payload).await?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(key_id = %key.id, expires = key.expires, "ephemeral key minted");
        Ok(key)
    }

    /// Fetches the publishable key and payment mode.
    ///
    /// An empty publishable key is returned as-is; see
    /// [`Self::build_payment_sheet_context`] for where it is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.fetch_config", skip_all, err)
    )]
    pub async fn fetch_config(&self) -> Result<StripeConfig, ServiceError> {
        let config: StripeConfig = self.call(Procedure::GetConfig, &EmptyPayload {}).await?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            publishable_key = %paysheet::sheet::key_prefix(&config.publishable_key),
            payment_mode = ?config.payment_mode,
            "stripe config fetched"
        );
        Ok(config)
    }

    /// Lists the customer's saved cards, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    pub async fn list_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethod>, ServiceError> {
        self.list_payment_methods_of_type(customer_id, DEFAULT_PAYMENT_METHOD_TYPE)
            .await
    }

    /// Lists the customer's saved payment methods of one type, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.list_payment_methods", skip_all, fields(customer = %customer_id, method_type = %payment_method_type), err)
    )]
    pub async fn list_payment_methods_of_type(
        &self,
        customer_id: &str,
        payment_method_type: &str,
    ) -> Result<Vec<PaymentMethod>, ServiceError> {
        let payload = ListPaymentMethodsRequest {
            stripe_customer_id: customer_id,
            payment_method_type,
        };
        let list: PaymentMethodList = self.call(Procedure::ListPaymentMethods, &payload).await?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(count = list.payment_methods.len(), "payment methods listed");
        Ok(list.payment_methods)
    }

    /// Detaches a saved payment method from the customer.
    ///
    /// Callers holding a cached list must refresh it themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.detach_payment_method", skip_all, fields(customer = %customer_id, payment_method = %payment_method_id), err)
    )]
    pub async fn detach_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), ServiceError> {
        let payload = DetachPaymentMethodRequest {
            stripe_customer_id: customer_id,
            payment_method_id,
        };
        let _detached: DetachPaymentMethodResponse =
            self.call(Procedure::DetachPaymentMethod, &payload).await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(detached = %_detached.detached_payment_method_id, "payment method detached");
        Ok(())
    }

    /// Creates a payment intent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a precondition fails or the call fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.create_payment_intent", skip_all, fields(shop = %request.shop_id, amount_cents = request.amount_cents.get(), currency = %request.currency), err)
    )]
    pub async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        let intent: PaymentIntent = self.call(Procedure::CreatePaymentIntent, request).await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(
            intent = %intent.payment_intent_id,
            amount = intent.amount,
            livemode = intent.livemode,
            "payment intent created"
        );
        Ok(intent)
    }

    /// Assembles the credentials for one payment-sheet presentation.
    ///
    /// Fetches the config, then mints an ephemeral key, strictly in that
    /// order, so a config failure is never hidden behind a key failure. The
    /// key is always fresh.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidResponse`] if the publishable key is
    /// empty, or any error from the two calls.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.service.build_payment_sheet_context", skip_all, fields(customer = %customer_id), err)
    )]
    pub async fn build_payment_sheet_context(
        &self,
        customer_id: &str,
        payment_intent_client_secret: &str,
    ) -> Result<PaymentSheetContext, ServiceError> {
        let config = self.fetch_config().await?;
        if config.publishable_key.trim().is_empty() {
            #[cfg(feature = "telemetry")]
            tracing::warn!("publishable key missing from stripe config");
            return Err(ServiceError::InvalidResponse);
        }
        let key = self.create_ephemeral_key(customer_id).await?;
        Ok(PaymentSheetContext {
            publishable_key: config.publishable_key,
            customer_id: customer_id.to_owned(),
            ephemeral_key_secret: key.secret,
            payment_intent_client_secret: payment_intent_client_secret.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paysheet::{AuthError, SignedInUser, StaticAuthProvider};
    use serde_json::{Value, json};
    use std::num::NonZeroU64;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> PaymentService {
        PaymentService::new(
            ServiceConfig::new(server.uri()),
            StaticAuthProvider::signed_in("uid-1", "tok-1"),
        )
    }

    async fn mount(server: &MockServer, procedure: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/{procedure}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn config_body(publishable_key: &str) -> Value {
        json!({"result": {"publishable_key": publishable_key, "payment_mode": "test", "platform_fee_bps": 250}})
    }

    fn key_body() -> Value {
        json!({"result": {
            "id": "ephkey_1",
            "object": "ephemeral_key",
            "secret": "ek_test_1",
            "created": 1_700_000_000,
            "livemode": false,
            "expires": 1_700_003_600,
            "associated_objects": [{"type": "customer", "id": "cus_1"}]
        }})
    }

    async fn request_paths(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_owned())
            .collect()
    }

    struct FailingUser;

    #[async_trait::async_trait]
    impl SignedInUser for FailingUser {
        fn uid(&self) -> &str {
            "uid-broken"
        }

        async fn id_token(&self) -> Result<AuthToken, AuthError> {
            Err(AuthError::new("refresh token revoked"))
        }
    }

    struct FailingProvider;

    impl AuthProvider for FailingProvider {
        fn current_user(&self) -> Option<Arc<dyn SignedInUser>> {
            Some(Arc::new(FailingUser))
        }
    }

    #[tokio::test]
    async fn test_ensure_customer_returns_customer() {
        let server = MockServer::start().await;
        mount(
            &server,
            "create-customer",
            json!({"result": {"stripeCustomerId": "cus_1", "created": false}}),
        )
        .await;

        let customer = service(&server).ensure_customer().await.unwrap();
        assert_eq!(customer.customer_id, "cus_1");
        assert!(!customer.created);
    }

    #[tokio::test]
    async fn test_signed_out_fails_without_network() {
        let server = MockServer::start().await;
        let service = PaymentService::new(
            ServiceConfig::new(server.uri()),
            StaticAuthProvider::signed_out(),
        );

        assert_eq!(
            service.ensure_customer().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert_eq!(
            service.fetch_config().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert_eq!(
            service.create_ephemeral_key("cus_1").await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert_eq!(
            service.list_payment_methods("cus_1").await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert_eq!(
            service.detach_payment_method("cus_1", "pm_1").await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        let request = CreatePaymentIntentRequest::new("S1", NonZeroU64::new(500).unwrap());
        assert_eq!(
            service.create_payment_intent(&request).await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert_eq!(
            service
                .build_payment_sheet_context("cus_1", "pi_secret")
                .await
                .unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert!(request_paths(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_not_authenticated_precedes_missing_base_url() {
        let service = PaymentService::new(ServiceConfig::default(), StaticAuthProvider::signed_out());
        assert_eq!(
            service.ensure_customer().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_missing_base_url() {
        let service = PaymentService::new(
            ServiceConfig::default(),
            StaticAuthProvider::signed_in("uid-1", "tok-1"),
        );
        assert_eq!(
            service.fetch_config().await.unwrap_err(),
            ServiceError::MissingBaseUrl
        );
        let service = PaymentService::new(
            ServiceConfig::new("not a url"),
            StaticAuthProvider::signed_in("uid-1", "tok-1"),
        );
        assert_eq!(
            service.ensure_customer().await.unwrap_err(),
            ServiceError::MissingBaseUrl
        );
    }

    #[tokio::test]
    async fn test_token_failure_is_not_authenticated() {
        let server = MockServer::start().await;
        let service = PaymentService::new(ServiceConfig::new(server.uri()), FailingProvider);
        assert_eq!(
            service.ensure_customer().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert!(request_paths(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_payment_intent_sends_minimal_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-payment-intent"))
            .and(body_json(json!({"data": {"shopId": "S1", "amountCents": 500, "currency": "usd"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {
                "payment_intent_id": "pi_1",
                "client_secret": "pi_1_secret_x",
                "amount": 500,
                "currency": "usd",
                "livemode": false
            }})))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreatePaymentIntentRequest::new("S1", NonZeroU64::new(500).unwrap())
            .with_currency("USD");
        let intent = service(&server).create_payment_intent(&request).await.unwrap();
        assert_eq!(intent.payment_intent_id, "pi_1");
        assert_eq!(intent.client_secret, "pi_1_secret_x");
        assert_eq!(intent.application_fee_amount, None);
    }

    #[tokio::test]
    async fn test_create_ephemeral_key_pins_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-ephemeral-key"))
            .and(body_json(json!({"data": {"stripeCustomerId": "cus_1", "apiVersion": "2025-08-27.basil"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(key_body()))
            .expect(1)
            .mount(&server)
            .await;

        let key = service(&server).create_ephemeral_key("cus_1").await.unwrap();
        assert_eq!(key.secret, "ek_test_1");
        assert_eq!(key.associated_objects[0].id, "cus_1");
    }

    #[tokio::test]
    async fn test_list_payment_methods_preserves_order() {
        let server = MockServer::start().await;
        mount(
            &server,
            "list-payment-methods",
            json!({"result": {"paymentMethods": [
                {"id": "pm_b", "type": "card"},
                {"id": "pm_a", "type": "card"},
                {"id": "pm_c", "type": "card"}
            ]}}),
        )
        .await;

        let ids: Vec<String> = service(&server)
            .list_payment_methods("cus_1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["pm_b", "pm_a", "pm_c"]);
    }

    #[tokio::test]
    async fn test_detach_payment_method() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detach-payment-method"))
            .and(body_json(json!({"data": {"stripeCustomerId": "cus_1", "paymentMethodId": "pm_1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"detachedPaymentMethodId": "pm_1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        service(&server)
            .detach_payment_method("cus_1", "pm_1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_build_context_fetches_config_before_key() {
        let server = MockServer::start().await;
        mount(&server, "get-config", config_body("pk_test_abc")).await;
        mount(&server, "create-ephemeral-key", key_body()).await;

        let context = service(&server)
            .build_payment_sheet_context("cus_1", "pi_1_secret_x")
            .await
            .unwrap();
        assert_eq!(context.publishable_key, "pk_test_abc");
        assert_eq!(context.customer_id, "cus_1");
        assert_eq!(context.ephemeral_key_secret, "ek_test_1");
        assert_eq!(context.payment_intent_client_secret, "pi_1_secret_x");
        assert_eq!(
            request_paths(&server).await,
            ["/get-config", "/create-ephemeral-key"]
        );
    }

    #[tokio::test]
    async fn test_build_context_mints_fresh_key_each_time() {
        let server = MockServer::start().await;
        mount(&server, "get-config", config_body("pk_test_abc")).await;
        mount(&server, "create-ephemeral-key", key_body()).await;

        let service = service(&server);
        service.build_payment_sheet_context("cus_1", "s1").await.unwrap();
        service.build_payment_sheet_context("cus_1", "s2").await.unwrap();
        let keys = request_paths(&server)
            .await
            .into_iter()
            .filter(|p| p == "/create-ephemeral-key")
            .count();
        assert_eq!(keys, 2);
    }

    #[tokio::test]
    async fn test_build_context_rejects_empty_publishable_key() {
        let server = MockServer::start().await;
        mount(&server, "get-config", config_body("")).await;
        Mock::given(method("POST"))
            .and(path("/create-ephemeral-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(key_body()))
            .expect(0)
            .mount(&server)
            .await;

        let err = service(&server)
            .build_payment_sheet_context("cus_1", "pi_secret")
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidResponse);
    }

    #[tokio::test]
    async fn test_build_context_reports_config_failure_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-config"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"status": "internal", "message": "Stripe is not configured"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/create-ephemeral-key"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"status": "internal", "message": "key failure"}
            })))
            .expect(0)
            .mount(&server)
            .await;

        let err = service(&server)
            .build_payment_sheet_context("cus_1", "pi_secret")
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Callable("Stripe is not configured".into()));
    }
}
