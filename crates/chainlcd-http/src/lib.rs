//! chainlcd-http — `reqwest` implementation of [`RestTransport`].
//!
//! # Quick start
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainlcd_core::{Registry, RegistryConfig};
//! use chainlcd_http::HttpRestClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpRestClient::with_defaults()?);
//! let registry = Registry::new(client, RegistryConfig::default());
//! # Ok(())
//! # }
//! ```
//!
//! [`RestTransport`]: chainlcd_core::RestTransport

pub mod client;

pub use client::{HttpClientConfig, HttpRestClient};
