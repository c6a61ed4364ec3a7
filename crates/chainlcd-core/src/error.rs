//! Error types for transports, dispatch and configuration.

use thiserror::Error;

/// Errors raised by a single outbound HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS error, body read failure, etc.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// No response within the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The response body was not valid JSON.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Errors surfaced by [`Dispatcher::request`](crate::Dispatcher::request).
///
/// `RateLimited` and `RequestFailed` describe single attempts. They are
/// absorbed by the retry loop and only reach the caller wrapped in
/// `AttemptsExhausted`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatcher was built with an empty endpoint list.
    #[error("No endpoint configured")]
    NoEndpointConfigured,

    /// The endpoint answered HTTP 429.
    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimited { endpoint: String },

    /// Non-2xx status, timeout, transport error or non-JSON body.
    #[error("Request to {endpoint} failed: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// Every attempt failed; carries the last attempt's error.
    #[error("All {attempts} attempts failed, last error: {last}")]
    AttemptsExhausted {
        attempts: u32,
        last: Box<DispatchError>,
    },

    /// A successful body did not match the caller's type.
    #[error("Response decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl DispatchError {
    /// The error of the last attempt, looking through `AttemptsExhausted`.
    pub fn last_attempt(&self) -> &DispatchError {
        match self {
            Self::AttemptsExhausted { last, .. } => last,
            other => other,
        }
    }
}

/// Configuration and endpoint-list errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid endpoint address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to read config '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),
}
