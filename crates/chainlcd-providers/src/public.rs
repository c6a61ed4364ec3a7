//! Public / community Cosmos endpoints.
//!
//! Free, no-API-key mirrors suitable for development and as a fallback
//! directory. Rate limits are low and availability varies, which is what
//! the dispatcher is for.

use chainlcd_core::EndpointConfig;

use crate::chains::{ChainConfig, ChainDirectory};

fn endpoints(list: &[(&str, &str)]) -> Vec<EndpointConfig> {
    list.iter()
        .filter_map(|(address, provider)| EndpointConfig::new(*address, *provider).ok())
        .collect()
}

/// Cosmos Hub mainnet.
pub fn cosmoshub() -> ChainConfig {
    ChainConfig {
        chain_name: "cosmoshub".into(),
        api: endpoints(&[
            ("https://cosmos-rest.publicnode.com", "PublicNode"),
            ("https://rest.cosmos.directory/cosmoshub", "cosmos.directory"),
            ("https://cosmos-api.polkachu.com", "Polkachu"),
            ("https://lcd-cosmoshub.keplr.app", "Keplr"),
        ]),
        rpc: endpoints(&[
            ("https://cosmos-rpc.publicnode.com", "PublicNode"),
            ("https://rpc.cosmos.directory/cosmoshub", "cosmos.directory"),
            ("https://cosmos-rpc.polkachu.com", "Polkachu"),
        ]),
        addr_prefix: Some("cosmos".into()),
    }
}

/// Osmosis mainnet.
pub fn osmosis() -> ChainConfig {
    ChainConfig {
        chain_name: "osmosis".into(),
        api: endpoints(&[
            ("https://osmosis-rest.publicnode.com", "PublicNode"),
            ("https://rest.cosmos.directory/osmosis", "cosmos.directory"),
            ("https://osmosis-api.polkachu.com", "Polkachu"),
            ("https://lcd.osmosis.zone", "Osmosis Foundation"),
        ]),
        rpc: endpoints(&[
            ("https://osmosis-rpc.publicnode.com", "PublicNode"),
            ("https://rpc.cosmos.directory/osmosis", "cosmos.directory"),
            ("https://osmosis-rpc.polkachu.com", "Polkachu"),
        ]),
        addr_prefix: Some("osmo".into()),
    }
}

/// Built-in directory used when no chain file is given.
pub fn directory() -> ChainDirectory {
    ChainDirectory::new(vec![cosmoshub(), osmosis()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_complete() {
        let hub = cosmoshub();
        assert_eq!(hub.api.len(), 4);
        assert_eq!(hub.rpc.len(), 3);
        assert_eq!(hub.api[0].provider(), "PublicNode");
    }

    #[test]
    fn builtin_directory_lookup() {
        let dir = directory();
        assert_eq!(dir.find("osmosis").unwrap().addr_prefix.as_deref(), Some("osmo"));
        assert!(dir.find("cosmoshub").is_ok());
    }
}
