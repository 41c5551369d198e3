//! Klaxon webhook notification relay.
//!
//! Reads a trigger document from a file path argument (or stdin when no
//! argument is given), formats each contained message, and delivers it to
//! the configured chat webhook.
//!
//! Environment variables:
//! - `KLAXON_WEBHOOK_URL`: destination webhook URL (required)
//! - `KLAXON_TIMEOUT_SECS`: per-attempt request timeout (default: 10)
//! - `KLAXON_MAX_RETRIES`: retries after the initial attempt (default: 3)
//! - `KLAXON_BACKOFF_MS`: base backoff delay (default: 600)
//! - `RUST_LOG`: log level (default: info)

use std::io::Read;

use anyhow::{Context, Result};
use klaxon::{trigger, Config};
use klaxon_delivery::DeliveryClient;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    info!(
        endpoint = %config.webhook_url_masked(),
        max_retries = config.max_retries,
        timeout_secs = config.timeout.as_secs(),
        "Configuration loaded"
    );

    let event = read_event()?;
    let client = DeliveryClient::new(config.to_client_config())?;

    let summary = trigger::run(&event, &client).await?;
    info!(delivered = summary.delivered, "Relay run complete");

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,klaxon=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).init();
}

/// Reads the trigger document from the first argument or stdin.
fn read_event() -> Result<serde_json::Value> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read trigger document from {path}"))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read trigger document from stdin")?;
            buffer
        },
    };

    serde_json::from_str(&text).context("trigger document is not valid JSON")
}
