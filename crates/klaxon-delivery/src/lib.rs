//! Webhook delivery client with bounded retries and backoff.
//!
//! This crate implements the delivery core: it turns an [`OutboundPayload`]
//! into an HTTP request, enforces the endpoint's size limits, and survives
//! transient failures via a retry state machine.
//!
//! # Retry behavior
//!
//! Each `send` call classifies every response and acts on the result:
//!
//! - **2xx**: delivered, done.
//! - **429**: sleep for the `Retry-After` hint (or exponential backoff)
//!   and retry for as long as the rate limit persists. Rate-limit retries
//!   are governed by the server's hint, not the retry budget.
//! - **5xx / network / timeout**: exponential backoff (`base, 2*base,
//!   4*base, ...`) up to `max_retries` retries after the initial attempt,
//!   then fail carrying the last transient error.
//! - **other 4xx**: permanent, fail immediately with status, reason, and
//!   a truncated response body.
//! - **anything else**: fail immediately.
//!
//! # Example
//!
//! ```no_run
//! use klaxon_delivery::{ClientConfig, DeliveryClient, OutboundPayload};
//!
//! # async fn example() -> klaxon_delivery::Result<()> {
//! let client = DeliveryClient::new(ClientConfig::new("https://example.com/webhook"))?;
//! client.send(OutboundPayload::text("disk space low on web-1")).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod error;
pub mod payload;

pub use client::{ClientConfig, DeliveryClient};
pub use error::{DeliveryError, Result};
pub use payload::{Embed, EmbedField, OutboundPayload, MAX_CONTENT_CHARS, MAX_EMBEDS};

/// Default per-attempt HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Default maximum retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff in milliseconds.
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 600;
