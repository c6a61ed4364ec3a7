//! Endpoint identity and per-endpoint failure state.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::ConfigError;

/// Static identity of one mirror: a base URL and a provider label.
///
/// The address is validated as an absolute `http`/`https` URL and stored
/// without a trailing slash, so `address + "/cosmos/..."` is always a
/// well-formed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEndpointConfig")]
pub struct EndpointConfig {
    address: String,
    provider: String,
}

#[derive(Deserialize)]
struct RawEndpointConfig {
    address: String,
    #[serde(default)]
    provider: String,
}

impl TryFrom<RawEndpointConfig> for EndpointConfig {
    type Error = ConfigError;

    fn try_from(raw: RawEndpointConfig) -> Result<Self, Self::Error> {
        Self::new(raw.address, raw.provider)
    }
}

impl EndpointConfig {
    /// Validate and build an endpoint identity.
    pub fn new(
        address: impl Into<String>,
        provider: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let address = address.into();
        let trimmed = address.trim().trim_end_matches('/');
        let invalid = |reason: String| ConfigError::InvalidAddress {
            address: address.clone(),
            reason,
        };

        let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme '{other}'"))),
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }

        Ok(Self {
            address: trimmed.to_string(),
            provider: provider.into(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Join a caller-supplied relative path onto the base address.
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.address, path)
        } else {
            format!("{}/{}", self.address, path)
        }
    }
}

impl std::fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.provider.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.provider, self.address)
        }
    }
}

/// An endpoint together with its mutable failure state.
///
/// Owned by exactly one dispatcher; never removed, only reset on recovery.
#[derive(Debug, Clone)]
pub struct Endpoint {
    config: EndpointConfig,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            failure_count: 0,
            last_failure_at: None,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn address(&self) -> &str {
        self.config.address()
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.last_failure_at
    }

    /// Count one failed attempt at `now`. Returns the new failure count.
    pub fn record_failure(&mut self, now: Instant) -> u32 {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(now);
        self.failure_count
    }

    /// Clear the failure count. Returns `true` if the endpoint had failures.
    pub fn record_success(&mut self) -> bool {
        let recovered = self.failure_count > 0;
        self.failure_count = 0;
        recovered
    }
}
