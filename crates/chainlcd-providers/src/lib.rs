//! chainlcd-providers — where endpoint lists come from and what to ask them.
//!
//! - [`chains`] — JSON chain directory (`chain_name`, `api`, `rpc`, `addr_prefix`)
//! - [`public`] — built-in public mirrors for Cosmos Hub and Osmosis
//! - [`paths`] — Cosmos SDK REST / Tendermint RPC request paths
//!
//! # Quick start
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainlcd_core::{Registry, RegistryConfig, RequestOptions};
//! use chainlcd_http::HttpRestClient;
//! use chainlcd_providers::{paths, public};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new(Arc::new(HttpRestClient::with_defaults()?), RegistryConfig::default());
//! let hub = public::directory().connect(&registry, "cosmoshub")?;
//! let balances = hub.api.request(&paths::balances("cosmos1..."), &RequestOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod chains;
pub mod paths;
pub mod public;

pub use chains::{slugify, ChainConfig, ChainDirectory};
