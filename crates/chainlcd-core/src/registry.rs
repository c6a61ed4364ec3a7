//! Service registry: one REST and one RPC dispatcher per logical service,
//! plus the background probe schedule that keeps their health records fresh.
//!
//! The registry is an owned object. Build it once at startup, share it via
//! `Arc`, and call [`Registry::shutdown`] to stop the probe tasks. Dropping
//! the registry also cancels them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::RegistryConfig;
use crate::dispatcher::{Dispatcher, DispatcherStats};
use crate::endpoint::EndpointConfig;
use crate::error::DispatchError;
use crate::transport::{RequestOptions, RestTransport};

/// The dispatcher pair registered under one service key.
#[derive(Debug)]
pub struct ServiceDispatchers {
    pub api: Arc<Dispatcher>,
    pub rpc: Arc<Dispatcher>,
}

/// Stats for both dispatchers of a service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub api: DispatcherStats,
    pub rpc: DispatcherStats,
}

/// Lazily populated map from service key to its dispatchers.
pub struct Registry {
    transport: Arc<dyn RestTransport>,
    config: RegistryConfig,
    entries: Mutex<HashMap<String, Arc<ServiceDispatchers>>>,
    tasks: Mutex<Vec<(String, JoinHandle<()>)>>,
    shutdown: CancellationToken,
}

impl Registry {
    pub fn new(transport: Arc<dyn RestTransport>, config: RegistryConfig) -> Self {
        Self {
            transport,
            config,
            entries: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return the dispatchers for `key`, creating them on first use.
    ///
    /// The first call for a key wins: it builds both dispatchers from the
    /// given lists and, unless `probe_on_register` is off, starts the probe
    /// schedule (an immediate probe, then one every `probe_interval`).
    /// Later calls ignore their lists.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn get(
        &self,
        key: &str,
        api_endpoints: Vec<EndpointConfig>,
        rpc_endpoints: Vec<EndpointConfig>,
    ) -> Arc<ServiceDispatchers> {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get(key) {
            return entry.clone();
        }

        let entry = Arc::new(ServiceDispatchers {
            api: Arc::new(Dispatcher::new(
                format!("{key}/api"),
                api_endpoints,
                self.transport.clone(),
                self.config.api.clone(),
            )),
            rpc: Arc::new(Dispatcher::new(
                format!("{key}/rpc"),
                rpc_endpoints,
                self.transport.clone(),
                self.config.rpc.clone(),
            )),
        });
        entries.insert(key.to_string(), entry.clone());

        tracing::info!(
            service = key,
            api_endpoints = entry.api.len(),
            rpc_endpoints = entry.rpc.len(),
            "registered service"
        );

        if !self.config.probe_on_register {
            tracing::debug!(service = key, "probe schedule disabled");
        } else if self.shutdown.is_cancelled() {
            tracing::warn!(service = key, "registry shut down, not scheduling probes");
        } else {
            let handle = tokio::spawn(probe_schedule(
                key.to_string(),
                entry.clone(),
                self.config.probe_interval(),
                self.shutdown.child_token(),
            ));
            lock(&self.tasks).push((key.to_string(), handle));
        }

        entry
    }

    /// Existing dispatchers for `key`, without registering.
    pub fn lookup(&self, key: &str) -> Option<Arc<ServiceDispatchers>> {
        lock(&self.entries).get(key).cloned()
    }

    /// Registered service keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.entries).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Stats for a registered service.
    pub fn stats(&self, key: &str) -> Option<ServiceStats> {
        self.lookup(key).map(|entry| ServiceStats {
            api: entry.api.stats(),
            rpc: entry.rpc.stats(),
        })
    }

    /// Dispatch against the REST dispatcher of `key`, registering it with
    /// `endpoints` (and no RPC endpoints) if needed.
    pub async fn fetch_api(
        &self,
        key: &str,
        endpoints: Vec<EndpointConfig>,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, DispatchError> {
        let entry = self.get(key, endpoints, Vec::new());
        entry.api.request(path, options).await
    }

    /// Dispatch against the RPC dispatcher of `key`, registering it with
    /// `endpoints` (and no REST endpoints) if needed.
    pub async fn fetch_rpc(
        &self,
        key: &str,
        endpoints: Vec<EndpointConfig>,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, DispatchError> {
        let entry = self.get(key, Vec::new(), endpoints);
        entry.rpc.request(path, options).await
    }

    /// Stop every probe schedule and wait for the tasks to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks: Vec<_> = lock(&self.tasks).drain(..).collect();
        for (key, handle) in tasks {
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_panic() => {
                    tracing::error!(service = %key, "probe task panicked");
                }
                Err(e) => {
                    tracing::debug!(service = %key, error = %e, "probe task aborted");
                }
            }
        }
        tracing::info!("registry shut down");
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been requested.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("services", &self.keys())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

async fn probe_schedule(
    key: String,
    entry: Arc<ServiceDispatchers>,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                tracing::debug!(service = %key, "running health probes");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = future::join(entry.api.probe_all(), entry.rpc.probe_all()) => {}
                }
            }
        }
    }
    tracing::debug!(service = %key, "probe schedule stopped");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
