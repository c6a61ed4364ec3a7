//! Retrying multi-endpoint dispatcher.
//!
//! One dispatcher serves one logical service (e.g. a chain's LCD mirrors).
//! Every attempt picks an endpoint, charges it against the rate limiter,
//! sends the request under a timeout and feeds the outcome back into the
//! endpoint's failure state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::config::DispatcherConfig;
use crate::endpoint::EndpointConfig;
use crate::error::{DispatchError, TransportError};
use crate::health::{HealthProber, HealthRecord, HealthStatus};
use crate::policy::{
    CooldownConfig, FailureCooldown, FixedDelayRetry, RateLimiterConfig, RetryConfig,
    SlidingWindowLimiter,
};
use crate::selector::Selector;
use crate::transport::{RequestOptions, RestResponse, RestTransport};

/// Selection state mutated between suspension points.
#[derive(Debug)]
struct DispatchState {
    selector: Selector,
    limiter: SlidingWindowLimiter,
}

/// Per-endpoint line of [`DispatcherStats`].
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStats {
    pub address: String,
    pub provider: String,
    pub failures: u32,
    /// `failures < max_failures`; independent of probe results.
    pub healthy: bool,
    pub requests_in_window: usize,
    pub health: Option<HealthView>,
}

/// Serializable rendering of a [`HealthRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub status: HealthStatus,
    pub latency_ms: i64,
    pub checked_ms_ago: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthView {
    fn new(record: &HealthRecord, now: Instant) -> Self {
        let age = now.saturating_duration_since(record.checked_at);
        Self {
            status: record.status(),
            latency_ms: record.latency_ms(),
            checked_ms_ago: u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
            error: record.error(),
        }
    }
}

/// Point-in-time view of a dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStats {
    pub name: String,
    pub endpoints: Vec<EndpointStats>,
    pub cursor: usize,
}

/// How one attempt ended.
enum Outcome {
    Success(Value),
    RateLimited,
    Failed(TransportError),
}

/// Round-robin dispatcher over interchangeable endpoints.
///
/// Construct through [`Registry::get`](crate::Registry::get); the registry
/// owns the background probe schedule.
pub struct Dispatcher {
    name: String,
    config: DispatcherConfig,
    transport: Arc<dyn RestTransport>,
    retry: FixedDelayRetry,
    state: Mutex<DispatchState>,
    prober: HealthProber,
}

impl Dispatcher {
    /// Build a dispatcher. An empty list is accepted and reported as
    /// [`DispatchError::NoEndpointConfigured`] when a request is made.
    pub fn new(
        name: impl Into<String>,
        endpoints: Vec<EndpointConfig>,
        transport: Arc<dyn RestTransport>,
        config: DispatcherConfig,
    ) -> Self {
        let cooldown = FailureCooldown::new(CooldownConfig {
            max_failures: config.max_failures,
            cooldown: config.failure_cooldown(),
        });
        let limiter = SlidingWindowLimiter::new(RateLimiterConfig {
            window: config.rate_window(),
            max_requests: config.max_requests,
        });
        let retry = FixedDelayRetry::new(RetryConfig {
            max_attempts: config.max_attempts,
            delay: config.retry_delay(),
        });
        let prober = HealthProber::new(
            transport.clone(),
            endpoints.clone(),
            config.probe_path.clone(),
            config.probe_timeout(),
        );

        Self {
            name: name.into(),
            state: Mutex::new(DispatchState {
                selector: Selector::new(endpoints, cooldown),
                limiter,
            }),
            config,
            transport,
            retry,
            prober,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Number of configured endpoints.
    pub fn len(&self) -> usize {
        self.state().selector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().selector.is_empty()
    }

    /// `GET path` with the configured attempt budget; returns parsed JSON.
    pub async fn request(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, DispatchError> {
        self.request_with_attempts(path, options, self.config.max_attempts)
            .await
    }

    /// Convenience: dispatch and deserialize the body into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, DispatchError> {
        let value = self.request(path, options).await?;
        serde_json::from_value(value).map_err(DispatchError::Decode)
    }

    /// `GET path`, making at most `max_attempts` attempts (minimum one).
    ///
    /// Per-attempt failures are absorbed; the caller sees either the first
    /// successful body, `NoEndpointConfigured`, or `AttemptsExhausted`
    /// wrapping the last failure.
    pub async fn request_with_attempts(
        &self,
        path: &str,
        options: &RequestOptions,
        max_attempts: u32,
    ) -> Result<Value, DispatchError> {
        let retry = self.retry.with_attempts(max_attempts);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let (index, endpoint) = self
                .acquire()
                .ok_or(DispatchError::NoEndpointConfigured)?;
            let url = endpoint.url_for(path);

            tracing::debug!(
                service = %self.name,
                endpoint = %endpoint.address(),
                attempt,
                "dispatching request"
            );

            let err = match self.send_once(&url, options).await {
                Outcome::Success(value) => {
                    self.mark_success(index);
                    return Ok(value);
                }
                Outcome::RateLimited => DispatchError::RateLimited {
                    endpoint: endpoint.address().to_string(),
                },
                Outcome::Failed(source) => DispatchError::RequestFailed {
                    endpoint: endpoint.address().to_string(),
                    source,
                },
            };
            self.mark_failure(index, &err);

            let rate_limited = matches!(err, DispatchError::RateLimited { .. });
            match retry.next_delay(attempt) {
                // A 429 rotates straight to the next endpoint.
                Some(_) if rate_limited => {}
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    tracing::warn!(
                        service = %self.name,
                        attempts = attempt,
                        error = %err,
                        path,
                        "all attempts failed"
                    );
                    return Err(DispatchError::AttemptsExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
            }
        }
    }

    /// Run one probe cycle over every endpoint and wait for it to settle.
    pub async fn probe_all(&self) {
        self.prober.probe_all().await;
    }

    /// Latest probe record per endpoint address.
    pub fn health(&self) -> HashMap<String, HealthRecord> {
        self.prober.records_snapshot()
    }

    /// Snapshot of endpoint state, rate usage and probe results.
    pub fn stats(&self) -> DispatcherStats {
        let now = Instant::now();
        let health = self.prober.records_snapshot();
        let mut state = self.state();
        let DispatchState { selector, limiter } = &mut *state;
        let cooldown = selector.cooldown().clone();

        let endpoints = selector
            .endpoints()
            .iter()
            .map(|ep| EndpointStats {
                address: ep.address().to_string(),
                provider: ep.config().provider().to_string(),
                failures: ep.failure_count(),
                healthy: cooldown.is_below_threshold(ep),
                requests_in_window: limiter.usage(ep.address(), now),
                health: health.get(ep.address()).map(|r| HealthView::new(r, now)),
            })
            .collect();

        DispatcherStats {
            name: self.name.clone(),
            endpoints,
            cursor: selector.cursor(),
        }
    }

    /// Pick an endpoint and charge the request to it in one locked step.
    fn acquire(&self) -> Option<(usize, EndpointConfig)> {
        let now = Instant::now();
        let mut state = self.state();
        let DispatchState { selector, limiter } = &mut *state;
        let index = selector.pick(limiter, now)?;
        let endpoint = selector.endpoints()[index].config().clone();
        limiter.record(endpoint.address(), now);
        Some((index, endpoint))
    }

    async fn send_once(&self, url: &str, options: &RequestOptions) -> Outcome {
        let timeout = self.config.request_timeout();
        let resp = match tokio::time::timeout(timeout, self.transport.get(url, options)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Outcome::Failed(e),
            Err(_) => {
                return Outcome::Failed(TransportError::Timeout {
                    ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        };
        classify(resp)
    }

    fn mark_failure(&self, index: usize, err: &DispatchError) {
        let now = Instant::now();
        let mut state = self.state();
        let max = state.selector.cooldown().max_failures();
        if let Some(endpoint) = state.selector.get_mut(index) {
            let failures = endpoint.record_failure(now);
            tracing::warn!(
                service = %self.name,
                endpoint = %endpoint.address(),
                failures,
                max_failures = max,
                error = %err,
                "endpoint failed"
            );
        }
    }

    fn mark_success(&self, index: usize) {
        let mut state = self.state();
        if let Some(endpoint) = state.selector.get_mut(index) {
            if endpoint.record_success() {
                tracing::info!(
                    service = %self.name,
                    endpoint = %endpoint.address(),
                    "endpoint recovered"
                );
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn classify(resp: RestResponse) -> Outcome {
    if resp.is_rate_limited() {
        return Outcome::RateLimited;
    }
    if !resp.is_success() {
        return Outcome::Failed(TransportError::Status {
            status: resp.status,
        });
    }
    match serde_json::from_slice(&resp.body) {
        Ok(value) => Outcome::Success(value),
        Err(e) => Outcome::Failed(TransportError::Deserialization(e)),
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("endpoints", &self.len())
            .finish()
    }
}
