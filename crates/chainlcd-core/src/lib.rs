//! chainlcd-core — resilient dispatch over mirrored Cosmos REST/RPC endpoints.
//!
//! # Overview
//!
//! Public chain APIs are unreliable, rate limited and sometimes blocked.
//! This crate spreads requests over a list of interchangeable mirrors:
//!
//! - [`Registry`] — owned service map handing out one [`Dispatcher`] pair
//!   per chain and driving periodic health probes
//! - [`Dispatcher`] — retries over endpoints with a fixed delay and timeout
//! - [`selector`] — round-robin choice skipping cooled-down and rate-limited
//!   endpoints, with a fall back to the first endpoint
//! - [`policy`] module — failure cooldown, sliding-window rate limiter,
//!   fixed-delay retry
//! - [`health`] module — concurrent, informational endpoint probes
//! - [`RestTransport`] — the HTTP seam, implemented by `chainlcd-http`

pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod health;
pub mod policy;
pub mod registry;
pub mod selector;
pub mod transport;

pub use config::{DispatcherConfig, RegistryConfig, LCD_PROBE_PATH, RPC_PROBE_PATH};
pub use dispatcher::{Dispatcher, DispatcherStats, EndpointStats, HealthView};
pub use endpoint::{Endpoint, EndpointConfig};
pub use error::{ConfigError, DispatchError, TransportError};
pub use health::{HealthProber, HealthRecord, HealthStatus, ProbeResult};
pub use registry::{Registry, ServiceDispatchers, ServiceStats};
pub use transport::{RequestOptions, RestResponse, RestTransport};
