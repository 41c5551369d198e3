//! Environment configuration for the relay binary.

use std::time::Duration;

use anyhow::{Context, Result};
use klaxon_delivery::ClientConfig;

/// Service configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Destination webhook URL.
    pub webhook_url: String,
    /// Per-attempt HTTP request timeout.
    pub timeout: Duration,
    /// Maximum retries after the initial delivery attempt.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_backoff: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// `KLAXON_WEBHOOK_URL` is required; its absence is a fatal
    /// configuration error surfaced before any delivery attempt. The
    /// remaining settings fall back to the delivery crate's defaults:
    ///
    /// - `KLAXON_TIMEOUT_SECS` (default 10)
    /// - `KLAXON_MAX_RETRIES` (default 3)
    /// - `KLAXON_BACKOFF_MS` (default 600)
    pub fn from_env() -> Result<Self> {
        let webhook_url = std::env::var("KLAXON_WEBHOOK_URL")
            .context("KLAXON_WEBHOOK_URL environment variable not set")?;

        let timeout_secs = std::env::var("KLAXON_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(klaxon_delivery::DEFAULT_TIMEOUT_SECONDS);

        let max_retries = std::env::var("KLAXON_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(klaxon_delivery::DEFAULT_MAX_RETRIES);

        let backoff_ms = std::env::var("KLAXON_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(klaxon_delivery::DEFAULT_BASE_BACKOFF_MS);

        Ok(Self {
            webhook_url,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            base_backoff: Duration::from_millis(backoff_ms),
        })
    }

    /// Converts to the delivery crate's client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.timeout,
            max_retries: self.max_retries,
            base_backoff: self.base_backoff,
            ..ClientConfig::new(self.webhook_url.clone())
        }
    }

    /// Returns the webhook URL with its token path masked for logging.
    ///
    /// Webhook URLs embed a bearer-equivalent secret in the path, so only
    /// the scheme and host are safe to log.
    pub fn webhook_url_masked(&self) -> String {
        match self.webhook_url.find("://").map(|i| i + 3) {
            Some(host_start) => match self.webhook_url[host_start..].find('/') {
                Some(path_start) => {
                    format!("{}/***", &self.webhook_url[..host_start + path_start])
                },
                None => self.webhook_url.clone(),
            },
            None => "***".to_string(),
        }
    }
}
