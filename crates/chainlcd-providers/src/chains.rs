//! Chain directory: per-chain endpoint lists loaded from JSON.
//!
//! The expected document is an array of chain entries:
//!
//! ```json
//! [
//!   {
//!     "chain_name": "Cosmos Hub",
//!     "addr_prefix": "cosmos",
//!     "api": [{ "address": "https://cosmos-rest.publicnode.com", "provider": "PublicNode" }],
//!     "rpc": [{ "address": "https://cosmos-rpc.publicnode.com", "provider": "PublicNode" }]
//!   }
//! ]
//! ```
//!
//! Chains are addressed by slug: the lowercased name with whitespace runs
//! replaced by `-` ("Cosmos Hub" → "cosmos-hub").

use std::path::Path;
use std::sync::Arc;

use chainlcd_core::{ConfigError, EndpointConfig, Registry, ServiceDispatchers};
use serde::{Deserialize, Deserializer, Serialize};

/// Endpoint lists and metadata for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_name: String,
    /// Cosmos LCD (REST) mirrors, in preference order.
    #[serde(default, deserialize_with = "lenient_endpoints")]
    pub api: Vec<EndpointConfig>,
    /// Tendermint RPC mirrors, in preference order.
    #[serde(default, deserialize_with = "lenient_endpoints")]
    pub rpc: Vec<EndpointConfig>,
    /// Bech32 account prefix, e.g. `cosmos`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr_prefix: Option<String>,
}

impl ChainConfig {
    pub fn slug(&self) -> String {
        slugify(&self.chain_name)
    }
}

/// Lowercase and collapse every whitespace run into a single `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Deserialize)]
struct RawEndpoint {
    address: String,
    #[serde(default)]
    provider: String,
}

/// Community-maintained chain lists routinely carry dead or malformed
/// entries; drop those with a warning instead of rejecting the whole file.
fn lenient_endpoints<'de, D>(deserializer: D) -> Result<Vec<EndpointConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawEndpoint>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|r| match EndpointConfig::new(r.address, r.provider) {
            Ok(ep) => Some(ep),
            Err(e) => {
                tracing::warn!(error = %e, "skipping invalid endpoint");
                None
            }
        })
        .collect())
}

/// An ordered set of chains, looked up by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainDirectory {
    chains: Vec<ChainConfig>,
}

impl ChainDirectory {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let chains: Vec<ChainConfig> = serde_json::from_str(json)?;
        Ok(Self::new(chains))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn chains(&self) -> &[ChainConfig] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Find a chain by slug; the argument is slugified first, so
    /// "Cosmos Hub" and "cosmos-hub" both match.
    pub fn find(&self, name: &str) -> Result<&ChainConfig, ConfigError> {
        let slug = slugify(name);
        self.chains
            .iter()
            .find(|c| c.slug() == slug)
            .ok_or_else(|| ConfigError::UnknownChain(name.to_string()))
    }

    /// Register `name`'s endpoint lists with `registry` under its slug.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(
        &self,
        registry: &Registry,
        name: &str,
    ) -> Result<Arc<ServiceDispatchers>, ConfigError> {
        let chain = self.find(name)?;
        Ok(registry.get(&chain.slug(), chain.api.clone(), chain.rpc.clone()))
    }
}
