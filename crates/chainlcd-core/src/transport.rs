//! The `RestTransport` trait: the seam between dispatch logic and HTTP.

use async_trait::async_trait;

use crate::error::TransportError;

/// Extra request decoration applied to every attempt of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Additional headers, sent alongside `Accept: application/json`.
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// Raw outcome of one HTTP exchange: status plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Issues `GET` requests against absolute URLs.
///
/// Implementations report transport failures as errors and return every
/// HTTP response, whatever its status, as `Ok`. Timeouts are enforced by
/// the caller.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RestTransport>`.
#[async_trait]
pub trait RestTransport: Send + Sync + 'static {
    /// Send `GET url` with `Accept: application/json` and the given options.
    async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RestResponse, TransportError>;
}
