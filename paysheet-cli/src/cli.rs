//! Command-line arguments.

use std::num::NonZeroU64;

use clap::{Parser, Subcommand};
use paysheet::proto::{DEFAULT_CURRENCY, DEFAULT_PAYMENT_METHOD_TYPE, DEFAULT_STRIPE_API_VERSION};

/// Drive paysheet callable procedures from the terminal.
#[derive(Parser, Debug)]
#[command(name = "paysheet")]
#[command(version)]
#[command(about = "Call Stripe payment-sheet procedures as a signed-in user")]
pub struct Cli {
    /// Base URL of the callable procedures
    #[arg(long, env = "PAYSHEET_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// ID token of the signed-in user; calls fail as signed out without it
    #[arg(long, env = "PAYSHEET_ID_TOKEN", hide_env_values = true, global = true)]
    pub id_token: Option<String>,

    /// Uid of the signed-in user, used in logs
    #[arg(long, env = "PAYSHEET_UID", default_value = "cli", global = true)]
    pub uid: String,

    /// Stripe API version ephemeral keys are minted for
    #[arg(
        long,
        env = "PAYSHEET_STRIPE_API_VERSION",
        default_value = DEFAULT_STRIPE_API_VERSION,
        global = true
    )]
    pub api_version: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Procedure to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get or create the Stripe customer of the signed-in user
    Customer,

    /// Fetch the publishable key and payment mode
    Config,

    /// Mint an ephemeral key for a customer
    EphemeralKey {
        /// Stripe customer id
        #[arg(long)]
        customer: String,
    },

    /// List saved payment methods
    Methods {
        /// Stripe customer id
        #[arg(long)]
        customer: String,

        /// Payment method type
        #[arg(long = "type", default_value = DEFAULT_PAYMENT_METHOD_TYPE)]
        method_type: String,
    },

    /// Detach a saved payment method
    Detach {
        /// Stripe customer id
        #[arg(long)]
        customer: String,

        /// Payment method id
        #[arg(long)]
        payment_method: String,
    },

    /// Create a payment intent
    Intent {
        #[command(flatten)]
        intent: IntentArgs,

        /// Stripe customer id to attach the intent to
        #[arg(long)]
        customer: Option<String>,
    },

    /// Assemble a payment-sheet context for an existing intent
    Context {
        /// Stripe customer id
        #[arg(long)]
        customer: String,

        /// Payment intent client secret
        #[arg(long)]
        client_secret: String,
    },

    /// Resolve the customer and prepare a presentable payment sheet
    Checkout {
        #[command(flatten)]
        intent: IntentArgs,

        /// Merchant name shown in the sheet
        #[arg(long)]
        merchant: String,

        /// Reuse this payment intent client secret instead of creating one
        #[arg(long)]
        client_secret: Option<String>,

        /// Disallow delayed-notification payment methods
        #[arg(long)]
        no_delayed_methods: bool,

        /// Primary button label
        #[arg(long)]
        button_label: Option<String>,
    },
}

/// Payment intent fields shared by `intent` and `checkout`.
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct IntentArgs {
    /// Shop being paid
    #[arg(long)]
    pub shop: String,

    /// Amount in the smallest currency unit, e.g. cents
    #[arg(long)]
    pub amount: NonZeroU64,

    /// ISO currency code
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    /// Description forwarded to Stripe
    #[arg(long)]
    pub description: Option<String>,

    /// Caller's order identifier
    #[arg(long)]
    pub order_id: Option<String>,

    /// Address the receipt is mailed to
    #[arg(long)]
    pub receipt_email: Option<String>,
}
