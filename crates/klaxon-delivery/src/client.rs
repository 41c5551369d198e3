//! HTTP client for webhook delivery with retry and backoff.
//!
//! One `send` call owns its whole retry state machine: it clamps the
//! payload, posts it, classifies the response, and sleeps between attempts.
//! Server errors and network failures are retried up to the configured
//! budget with exponential backoff; rate limiting (429) is retried without
//! consuming the budget, honoring the server's `Retry-After` hint.

use std::{sync::Arc, time::Duration};

use reqwest::header::{ACCEPT, RETRY_AFTER};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{
    clock::{Clock, RealClock},
    error::{DeliveryError, Result},
    payload::{truncate_chars, OutboundPayload},
};

/// Maximum characters of a 4xx response body carried in the error.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Exponent cap keeping backoff arithmetic within `u32`.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Configuration for the webhook delivery client.
///
/// Immutable for the lifetime of a client instance; concurrent sends share
/// it read-only.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Destination webhook URL.
    pub endpoint_url: String,
    /// Per-attempt HTTP request timeout.
    pub timeout: Duration,
    /// Maximum retries after the initial attempt for transient failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff calculation.
    pub base_backoff: Duration,
    /// User agent string for requests. Some CDN front-ends reject requests
    /// without one.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given endpoint with default limits.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_millis(crate::DEFAULT_BASE_BACKOFF_MS),
            user_agent: concat!("Klaxon-Webhook-Relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP client for posting messages to a webhook endpoint.
///
/// Holds a pooled `reqwest::Client` and an immutable [`ClientConfig`].
/// Each `send` call runs an independent retry state machine; the client
/// coordinates nothing across calls and is safe to share.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
}

/// Classified result of a single delivery attempt.
#[derive(Debug)]
enum AttemptOutcome {
    /// 2xx response; the message was accepted.
    Success,
    /// 429 response; retry after the server hint or computed backoff.
    RateLimited {
        /// Parsed `Retry-After` header, if the server sent one
        retry_after: Option<Duration>,
    },
    /// Transient failure (5xx, network, timeout); retry within budget.
    Transient(DeliveryError),
    /// Terminal failure; surfaces to the caller immediately.
    Fatal(DeliveryError),
}

impl DeliveryClient {
    /// Creates a delivery client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the underlying HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(RealClock))
    }

    /// Creates a delivery client with an injected clock.
    ///
    /// Tests pass a [`crate::clock::TestClock`] to observe backoff delays
    /// without sleeping for real.
    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                DeliveryError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config, clock })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Delivers a message payload to the webhook endpoint.
    ///
    /// Oversized input is clamped to the endpoint's limits before
    /// transmission. A payload with nothing to send returns `Ok` without
    /// any network call.
    ///
    /// # Errors
    ///
    /// - `Permanent` for non-429 4xx responses, without retrying.
    /// - `RetriesExhausted` once transient failures (5xx, network, timeout)
    ///   spend the retry budget; carries the last such failure.
    /// - `UnexpectedStatus` for statuses outside 2xx/4xx/5xx.
    /// - `Internal` for unclassified failures, without retrying.
    ///
    /// Rate limiting is never surfaced: 429 responses are retried for as
    /// long as they persist, so a persistently rate-limited endpoint can
    /// block the call indefinitely.
    pub async fn send(&self, payload: OutboundPayload) -> Result<()> {
        let payload = payload.clamped();
        if payload.is_empty() {
            debug!("payload empty after clamping, nothing to send");
            return Ok(());
        }

        let span = info_span!("webhook_delivery", endpoint = %self.config.endpoint_url);
        self.post_with_retries(&payload).instrument(span).await
    }

    /// Runs the retry state machine until success or a terminal failure.
    async fn post_with_retries(&self, payload: &OutboundPayload) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            debug!(attempt, "posting webhook payload");

            match self.attempt(payload).await {
                AttemptOutcome::Success => {
                    info!(attempts = attempt + 1, "webhook delivered");
                    return Ok(());
                },
                AttemptOutcome::RateLimited { retry_after } => {
                    // Governed by the server's own hint rather than the
                    // retry budget: loops for as long as 429 persists.
                    let delay = retry_after
                        .unwrap_or_else(|| backoff_delay(self.config.base_backoff, attempt));
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        hinted = retry_after.is_some(),
                        "rate limited, backing off"
                    );
                    self.clock.sleep(delay).await;
                    attempt += 1;
                },
                AttemptOutcome::Transient(error) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        warn!(attempts = attempt, error = %error, "retry budget exhausted");
                        return Err(DeliveryError::retries_exhausted(attempt, error));
                    }
                    let delay = backoff_delay(self.config.base_backoff, attempt - 1);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "transient failure, backing off"
                    );
                    self.clock.sleep(delay).await;
                },
                AttemptOutcome::Fatal(error) => {
                    warn!(attempt, error = %error, "delivery failed permanently");
                    return Err(error);
                },
            }
        }
    }

    /// Performs one HTTP attempt and classifies the result.
    async fn attempt(&self, payload: &OutboundPayload) -> AttemptOutcome {
        let response = match self
            .client
            .post(&self.config.endpoint_url)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => return self.classify_request_error(&error),
        };

        let status = response.status();
        let retry_after = parse_retry_after(
            response.headers().get(RETRY_AFTER).and_then(|value| value.to_str().ok()),
        );
        let reason = status.canonical_reason().unwrap_or("");

        let body = if status.is_success() {
            String::new()
        } else {
            match response.text().await {
                Ok(text) => text,
                Err(error) => {
                    warn!(error = %error, "failed to read response body");
                    String::new()
                },
            }
        };

        classify_response(status.as_u16(), retry_after, reason, &body)
    }

    /// Classifies an error raised before any response was received.
    fn classify_request_error(&self, error: &reqwest::Error) -> AttemptOutcome {
        if error.is_timeout() {
            AttemptOutcome::Transient(DeliveryError::timeout(self.config.timeout.as_secs()))
        } else if error.is_connect() {
            AttemptOutcome::Transient(DeliveryError::network(error.to_string()))
        } else {
            // Unknown failure mode; never retried.
            AttemptOutcome::Fatal(DeliveryError::internal(error.to_string()))
        }
    }
}

/// Classifies an HTTP response into a retry-loop outcome.
///
/// Pure function over the response status, parsed `Retry-After` hint,
/// reason phrase, and body, independent of the transport.
fn classify_response(
    status: u16,
    retry_after: Option<Duration>,
    reason: &str,
    body: &str,
) -> AttemptOutcome {
    match status {
        200..=299 => AttemptOutcome::Success,
        429 => AttemptOutcome::RateLimited { retry_after },
        500..=599 => AttemptOutcome::Transient(DeliveryError::server_error(
            status,
            truncate_chars(body, MAX_ERROR_BODY_CHARS),
        )),
        400..=499 => AttemptOutcome::Fatal(DeliveryError::permanent(
            status,
            reason,
            truncate_chars(body, MAX_ERROR_BODY_CHARS),
        )),
        _ => AttemptOutcome::Fatal(DeliveryError::unexpected_status(status)),
    }
}

/// Parses a `Retry-After` header value as seconds.
///
/// The endpoint sends the delay as a numeric string, fractional seconds
/// allowed. Negative values clamp to zero; unparseable values are ignored
/// so the computed backoff applies instead.
fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    let seconds: f64 = value?.trim().parse().ok()?;
    Some(Duration::from_secs_f64(seconds.max(0.0)))
}

/// Computes the exponential backoff delay `base * 2^exponent`.
///
/// The rate-limit branch passes the attempt counter before incrementing it
/// while the transient branch increments first and passes `attempt - 1`;
/// both produce the sequence `base, 2*base, 4*base, ...` across consecutive
/// failures.
fn backoff_delay(base: Duration, exponent: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(exponent.min(MAX_BACKOFF_EXPONENT)))
}
