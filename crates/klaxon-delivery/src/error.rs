//! Error types for webhook delivery operations.
//!
//! Errors fall into two groups: per-attempt transient failures (network,
//! timeout, 5xx) that feed the retry loop, and terminal failures that
//! surface to the caller of `send`. Rate limiting never appears here; 429
//! responses are absorbed by the retry loop.

use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Failures that can occur while delivering a webhook message.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Delivery client could not be configured.
    #[error("invalid delivery configuration: {message}")]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },

    /// Network-level connectivity failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Description of the network failure
        message: String,
    },

    /// HTTP request timeout exceeded.
    #[error("request timeout after {seconds}s")]
    Timeout {
        /// Configured per-attempt timeout in seconds
        seconds: u64,
    },

    /// HTTP response indicated a server error (5xx).
    #[error("server error: HTTP {status}")]
    ServerError {
        /// HTTP status code (5xx)
        status: u16,
        /// Response body, truncated for diagnostics
        body: String,
    },

    /// HTTP response indicated a permanent client error (4xx, except 429).
    #[error("client error: HTTP {status} {reason}: {body}")]
    Permanent {
        /// HTTP status code (4xx)
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
        /// Response body, truncated to 500 characters
        body: String,
    },

    /// Response status outside the 2xx/4xx/5xx ranges.
    #[error("unexpected HTTP status: {status}")]
    UnexpectedStatus {
        /// The status code received
        status: u16,
    },

    /// All retry attempts exhausted for a transient failure.
    #[error("delivery failed after {attempts} attempts")]
    RetriesExhausted {
        /// Total attempts made, including the initial one
        attempts: u32,
        /// The last transient failure observed
        #[source]
        last: Box<DeliveryError>,
    },

    /// Unclassified failure during an attempt; never retried.
    #[error("internal delivery error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl DeliveryError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Creates a server error from an HTTP response.
    pub fn server_error(status: u16, body: impl Into<String>) -> Self {
        Self::ServerError { status, body: body.into() }
    }

    /// Creates a permanent client error from an HTTP response.
    pub fn permanent(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Permanent { status, reason: reason.into(), body: body.into() }
    }

    /// Creates an unexpected-status error.
    pub fn unexpected_status(status: u16) -> Self {
        Self::UnexpectedStatus { status }
    }

    /// Creates a retries-exhausted error wrapping the last transient failure.
    pub fn retries_exhausted(attempts: u32, last: DeliveryError) -> Self {
        Self::RetriesExhausted { attempts, last: Box::new(last) }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Returns true for failures the retry loop is allowed to retry.
    ///
    /// Network errors, timeouts, and server errors (5xx) are transient.
    /// Client errors, unexpected statuses, configuration problems, and
    /// unclassified failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::ServerError { .. }
        )
    }
}
