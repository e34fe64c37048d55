//! Subcommand execution.
//!
//! Every command prints a JSON summary. Ephemeral key secrets are never
//! printed; payment intent client secrets are, so they can be passed on to
//! `context`.

use paysheet::StaticAuthProvider;
use paysheet::proto::{CardDetails, CreatePaymentIntentRequest, PaymentMethod};
use paysheet::sheet::{PaymentSheetInitData, key_prefix};
use paysheet_http::{CheckoutRequest, CheckoutSession, PaymentService, ServiceConfig, SessionError};
use serde_json::{Value, json};

use crate::cli::{Cli, Command, IntentArgs};

/// Builds the service from global flags.
///
/// A missing or blank ID token yields a signed-out provider.
pub fn build_service(cli: &Cli) -> PaymentService {
    let config = ServiceConfig {
        base_url: cli.base_url.clone(),
        ..ServiceConfig::default()
    }
    .with_api_version(cli.api_version.clone());
    let auth = match cli.id_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => StaticAuthProvider::signed_in(cli.uid.clone(), token),
        _ => StaticAuthProvider::signed_out(),
    };
    PaymentService::new(config, auth)
}

impl IntentArgs {
    fn to_request(&self) -> CreatePaymentIntentRequest {
        let mut request =
            CreatePaymentIntentRequest::new(self.shop.clone(), self.amount).with_currency(&self.currency);
        request.description.clone_from(&self.description);
        request.order_id.clone_from(&self.order_id);
        request.receipt_email.clone_from(&self.receipt_email);
        request
    }
}

/// Runs one command.
pub async fn execute(service: PaymentService, command: Command) -> Result<Value, SessionError> {
    let output = match command {
        Command::Customer => {
            let customer = service.ensure_customer().await?;
            json!({"stripeCustomerId": customer.customer_id, "created": customer.created})
        }
        Command::Config => {
            let config = service.fetch_config().await?;
            json!({
                "publishableKey": config.publishable_key,
                "paymentMode": config.payment_mode,
                "platformFeeBps": config.platform_fee_bps,
            })
        }
        Command::EphemeralKey { customer } => {
            let key = service.create_ephemeral_key(&customer).await?;
            json!({
                "id": key.id,
                "created": key.created,
                "expires": key.expires,
                "livemode": key.livemode,
                "associatedObjects": key
                    .associated_objects
                    .iter()
                    .map(|o| json!({"type": o.object_type, "id": o.id}))
                    .collect::<Vec<_>>(),
            })
        }
        Command::Methods {
            customer,
            method_type,
        } => {
            let methods = service
                .list_payment_methods_of_type(&customer, &method_type)
                .await?;
            summarize_methods(&methods)
        }
        Command::Detach {
            customer,
            payment_method,
        } => {
            service
                .detach_payment_method(&customer, &payment_method)
                .await?;
            json!({"detachedPaymentMethodId": payment_method})
        }
        Command::Intent { intent, customer } => {
            let mut request = intent.to_request();
            request.stripe_customer_id = customer;
            let intent = service.create_payment_intent(&request).await?;
            json!({
                "paymentIntentId": intent.payment_intent_id,
                "clientSecret": intent.client_secret,
                "amount": intent.amount,
                "currency": intent.currency,
                "applicationFeeAmount": intent.application_fee_amount,
                "livemode": intent.livemode,
            })
        }
        Command::Context {
            customer,
            client_secret,
        } => {
            let context = service
                .build_payment_sheet_context(&customer, &client_secret)
                .await?;
            json!({
                "publishableKey": key_prefix(&context.publishable_key),
                "customerId": context.customer_id,
                "hasEphemeralKey": !context.ephemeral_key_secret.is_empty(),
            })
        }
        Command::Checkout {
            intent,
            merchant,
            client_secret,
            no_delayed_methods,
            button_label,
        } => {
            let mut request = CheckoutRequest::new(intent.to_request(), merchant)
                .with_delayed_payment_methods(!no_delayed_methods);
            request.existing_client_secret = client_secret;
            request.primary_button_label = button_label;

            let session = CheckoutSession::new(service);
            let customer_id = session.prepare().await?;
            let data = session
                .service()
                .prepare_checkout(&customer_id, &request)
                .await?;
            let mut output = summarize_sheet(&data);
            output["savedMethods"] = summarize_methods(&session.payment_methods().await);
            output
        }
    };
    Ok(output)
}

fn summarize_methods(methods: &[PaymentMethod]) -> Value {
    methods
        .iter()
        .map(|method| {
            json!({
                "id": method.id,
                "type": method.method_type,
                "label": method.card.as_ref().map(CardDetails::label),
                "expiry": method.card.as_ref().and_then(CardDetails::expiry),
            })
        })
        .collect()
}

fn summarize_sheet(data: &PaymentSheetInitData) -> Value {
    json!({
        "merchantDisplayName": data.merchant_display_name,
        "publishableKey": key_prefix(&data.publishable_key),
        "clientSecret": data.mode.client_secret(),
        "customerId": data.customer.as_ref().map(|c| c.id.as_str()),
        "allowsDelayedPaymentMethods": data.allows_delayed_payment_methods,
        "primaryButtonLabel": data.primary_button_label,
    })
}
