//! Dispatcher and registry configuration.
//!
//! Durations are stored as millisecond fields so the structs round-trip
//! through plain JSON; every field has a default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Probe path for Cosmos LCD (REST) endpoints.
pub const LCD_PROBE_PATH: &str = "/cosmos/base/tendermint/v1beta1/node_info";
/// Probe path for Tendermint RPC endpoints.
pub const RPC_PROBE_PATH: &str = "/status";

/// Tuning for one [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Failures after which an endpoint enters cooldown.
    pub max_failures: u32,
    /// How long a cooled-down endpoint is skipped.
    pub failure_cooldown_ms: u64,
    /// Sliding rate-limit window.
    pub rate_window_ms: u64,
    /// Requests allowed per endpoint inside the window.
    pub max_requests: usize,
    /// Timeout for one dispatched request.
    pub request_timeout_ms: u64,
    /// Fixed pause between failed attempts.
    pub retry_delay_ms: u64,
    /// Attempts made by [`Dispatcher::request`](crate::Dispatcher::request).
    pub max_attempts: u32,
    /// Timeout for one health probe.
    pub probe_timeout_ms: u64,
    /// Relative path requested by health probes.
    pub probe_path: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            failure_cooldown_ms: 60_000,
            rate_window_ms: 10_000,
            max_requests: 50,
            request_timeout_ms: 15_000,
            retry_delay_ms: 500,
            max_attempts: 3,
            probe_timeout_ms: 5_000,
            probe_path: LCD_PROBE_PATH.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Defaults for a Tendermint RPC service.
    pub fn rpc() -> Self {
        Self {
            probe_path: RPC_PROBE_PATH.to_string(),
            ..Self::default()
        }
    }

    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_cooldown_ms)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Tuning for the [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Config for each service's REST dispatcher.
    pub api: DispatcherConfig,
    /// Config for each service's RPC dispatcher.
    pub rpc: DispatcherConfig,
    /// Period of the background health probe.
    pub probe_interval_ms: u64,
    /// Start the probe schedule when a service is registered. One-shot
    /// callers turn this off and probe on demand.
    pub probe_on_register: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api: DispatcherConfig::default(),
            rpc: DispatcherConfig::rpc(),
            probe_interval_ms: 5 * 60 * 1_000,
            probe_on_register: true,
        }
    }
}

impl RegistryConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }
}
