//! HTTP REST client backed by `reqwest`.
//!
//! Sends plain `GET`s with `Accept: application/json` and hands every
//! response back with its status untouched; retry, timeout and endpoint
//! selection belong to the dispatcher in `chainlcd-core`.

use async_trait::async_trait;
use std::time::Duration;

use chainlcd_core::error::TransportError;
use chainlcd_core::transport::{RequestOptions, RestResponse, RestTransport};
use reqwest::header::{ACCEPT, USER_AGENT};

/// Configuration for [`HttpRestClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Upper bound for one exchange at the connection level. The dispatcher
    /// applies its own, usually shorter, per-attempt timeout on top.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("chainlcd/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Shared connection pool for all endpoints of all services.
#[derive(Debug, Clone)]
pub struct HttpRestClient {
    http: reqwest::Client,
    user_agent: String,
    timeout_ms: u64,
}

impl HttpRestClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            user_agent: config.user_agent,
            timeout_ms: u64::try_from(config.request_timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self, TransportError> {
        Self::new(HttpClientConfig::default())
    }
}

#[async_trait]
impl RestTransport for HttpRestClient {
    async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RestResponse, TransportError> {
        let mut req = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent);
        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::debug!(url, timeout_ms = self.timeout_ms, "client timeout");
                TransportError::Timeout { ms: self.timeout_ms }
            } else {
                TransportError::Http(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(format!("HTTP {status}: failed to read body: {e}")))?;

        Ok(RestResponse::new(status, body.to_vec()))
    }
}
