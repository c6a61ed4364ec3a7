//! Background health probing.
//!
//! Probe results are telemetry only. The selector never reads them, so an
//! endpoint reported unhealthy here can still be picked and attempted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future;
use serde::Serialize;
use tokio::time::Instant;

use crate::endpoint::EndpointConfig;
use crate::transport::{RequestOptions, RestTransport};

/// Coarse health of one endpoint as last probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Answered the probe with a 2xx.
    Healthy,
    /// Answered with another status, timed out or could not be reached.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        })
    }
}

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint answered, possibly with an error status.
    Reachable { http_status: u16, latency: Duration },
    /// Transport failure or timeout.
    Unreachable { reason: String },
}

/// Latest probe result for one endpoint, replaced wholesale on every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRecord {
    pub result: ProbeResult,
    pub checked_at: Instant,
}

impl HealthRecord {
    pub fn is_healthy(&self) -> bool {
        matches!(
            self.result,
            ProbeResult::Reachable { http_status, .. } if (200..300).contains(&http_status)
        )
    }

    pub fn status(&self) -> HealthStatus {
        if self.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Round-trip latency in milliseconds, `-1` when unreachable.
    pub fn latency_ms(&self) -> i64 {
        match &self.result {
            ProbeResult::Reachable { latency, .. } => {
                i64::try_from(latency.as_millis()).unwrap_or(i64::MAX)
            }
            ProbeResult::Unreachable { .. } => -1,
        }
    }

    /// Failure description for unreachable endpoints and error statuses.
    pub fn error(&self) -> Option<String> {
        match &self.result {
            ProbeResult::Unreachable { reason } => Some(reason.clone()),
            ProbeResult::Reachable { http_status, .. } if !self.is_healthy() => {
                Some(format!("HTTP {http_status}"))
            }
            ProbeResult::Reachable { .. } => None,
        }
    }
}

/// Probes every endpoint of one dispatcher and keeps the latest records.
pub struct HealthProber {
    transport: Arc<dyn RestTransport>,
    endpoints: Vec<EndpointConfig>,
    path: String,
    timeout: Duration,
    records: Mutex<HashMap<String, HealthRecord>>,
}

impl HealthProber {
    pub fn new(
        transport: Arc<dyn RestTransport>,
        endpoints: Vec<EndpointConfig>,
        path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            endpoints,
            path: path.into(),
            timeout,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Probe all endpoints concurrently and wait for every probe to settle.
    ///
    /// Never fails: each outcome, including timeouts and transport errors,
    /// becomes that endpoint's record.
    pub async fn probe_all(&self) {
        let probes = self.endpoints.iter().map(|endpoint| async move {
            let record = self.probe(endpoint).await;
            self.records().insert(endpoint.address().to_string(), record);
        });
        future::join_all(probes).await;
    }

    async fn probe(&self, endpoint: &EndpointConfig) -> HealthRecord {
        let url = endpoint.url_for(&self.path);
        let options = RequestOptions::default();
        let start = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.transport.get(&url, &options)).await {
            Ok(Ok(resp)) => ProbeResult::Reachable {
                http_status: resp.status,
                latency: start.elapsed(),
            },
            Ok(Err(e)) => ProbeResult::Unreachable {
                reason: e.to_string(),
            },
            Err(_) => ProbeResult::Unreachable {
                reason: format!("probe timed out after {}ms", self.timeout.as_millis()),
            },
        };

        let record = HealthRecord {
            result,
            checked_at: Instant::now(),
        };
        if record.is_healthy() {
            tracing::info!(
                provider = %endpoint.provider(),
                endpoint = %endpoint.address(),
                latency_ms = record.latency_ms(),
                "health probe ok"
            );
        } else {
            tracing::warn!(
                provider = %endpoint.provider(),
                endpoint = %endpoint.address(),
                latency_ms = record.latency_ms(),
                error = %record.error().unwrap_or_default(),
                "health probe failed"
            );
        }
        record
    }

    /// Snapshot of the latest record per endpoint address.
    pub fn records_snapshot(&self) -> HashMap<String, HealthRecord> {
        self.records().clone()
    }

    pub fn record_for(&self, address: &str) -> Option<HealthRecord> {
        self.records().get(address).cloned()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, HealthRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HealthProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthProber")
            .field("endpoints", &self.endpoints.len())
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .finish()
    }
}
