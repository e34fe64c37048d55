//! Command-line driver for paysheet callable procedures.
//!
//! # Usage
//!
//! ```bash
//! # Resolve the customer of the signed-in user
//! paysheet --base-url https://us-central1-example.cloudfunctions.net --id-token "$TOKEN" customer
//!
//! # Create an intent and assemble a payment sheet for it
//! paysheet intent --shop S1 --amount 500 --customer cus_1
//! paysheet context --customer cus_1 --client-secret pi_1_secret_x
//!
//! # Configure logging level
//! RUST_LOG=paysheet_http=trace paysheet config
//! ```
//!
//! # Environment Variables
//!
//! Read from the process environment or a `.env` file in the working directory.
//!
//! - `PAYSHEET_BASE_URL` - Base URL of the callable procedures
//! - `PAYSHEET_ID_TOKEN` - ID token of the signed-in user
//! - `PAYSHEET_UID` - Uid of the signed-in user (default: `cli`)
//! - `PAYSHEET_STRIPE_API_VERSION` - Stripe API version for ephemeral keys
//! - `RUST_LOG` - Log level filter (default: `info`)

mod cli;
mod commands;

use std::io::Write;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("paysheet failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let service = commands::build_service(&cli);
    tracing::debug!(config = ?service.config(), "loaded configuration");

    let output = commands::execute(service, cli.command).await?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}
