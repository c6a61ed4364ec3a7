//! chainlcd CLI — query and probe Cosmos LCD/RPC mirrors from the terminal.
//!
//! Usage:
//! ```bash
//! # List known chains (built-in public mirrors unless --chains is given)
//! chainlcd chains
//!
//! # Dispatch a REST query across the chain's LCD mirrors
//! chainlcd get cosmoshub /cosmos/bank/v1beta1/balances/cosmos1...
//!
//! # Tendermint RPC instead of LCD
//! chainlcd get osmosis /status --rpc
//!
//! # One probe cycle over every mirror
//! chainlcd probe cosmoshub
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use chainlcd_core::{Registry, RegistryConfig, RequestOptions, RestTransport, ServiceDispatchers};
use chainlcd_http::HttpRestClient;
use chainlcd_providers::{public, ChainDirectory};

mod logging;

use logging::LogConfig;

#[derive(Parser)]
#[command(
    name = "chainlcd",
    about = "Resilient dispatcher for Cosmos LCD and Tendermint RPC mirrors",
    version
)]
struct Cli {
    /// Chain directory JSON file (default: built-in public mirrors)
    #[arg(long, global = true, env = "CHAINLCD_CHAINS")]
    chains: Option<PathBuf>,

    /// Dispatcher / registry config JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or EnvFilter directive
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Per-crate log level, e.g. chainlcd-core=debug (repeatable)
    #[arg(long = "log-component", global = true, value_name = "CRATE=LEVEL", value_parser = parse_component)]
    log_components: Vec<(String, String)>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List chains in the directory
    Chains,

    /// Dispatch a GET and print the JSON response
    Get {
        /// Chain name or slug, e.g. cosmoshub
        chain: String,
        /// Path relative to the endpoint base, e.g. /cosmos/bank/v1beta1/balances/<addr>
        path: String,
        /// Use the Tendermint RPC mirrors instead of LCD
        #[arg(long)]
        rpc: bool,
        /// Attempt budget (default: max_attempts from config)
        #[arg(long)]
        attempts: Option<u32>,
    },

    /// Probe every mirror of a chain once and print the results
    Probe {
        chain: String,
    },

    /// Probe a chain and print its dispatcher snapshot as JSON
    Stats {
        chain: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        components: cli.log_components.iter().cloned().collect(),
        json: cli.json_logs,
    });

    let directory = match &cli.chains {
        Some(path) => ChainDirectory::from_path(path)
            .with_context(|| format!("load chain directory '{}'", path.display()))?,
        None => public::directory(),
    };

    if let Commands::Chains = cli.command {
        return cmd_chains(&directory);
    }

    let config = match &cli.config {
        Some(path) => RegistryConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => RegistryConfig::default(),
    };
    let transport = Arc::new(HttpRestClient::with_defaults().context("build HTTP client")?);
    let registry = one_shot_registry(transport, config);

    let result = match cli.command {
        Commands::Chains => Ok(()),
        Commands::Get { chain, path, rpc, attempts } => {
            cmd_get(&registry, &directory, &chain, &path, rpc, attempts).await
        }
        Commands::Probe { chain } => cmd_probe(&registry, &directory, &chain).await,
        Commands::Stats { chain } => cmd_stats(&registry, &directory, &chain).await,
    };

    registry.shutdown().await;
    result
}

fn parse_component(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((component, level)) if !component.is_empty() && !level.is_empty() => {
            Ok((component.to_string(), level.to_string()))
        }
        _ => Err(format!("expected CRATE=LEVEL, got '{s}'")),
    }
}

/// Each invocation runs at most one probe cycle itself, so registration
/// must not start the background schedule.
fn one_shot_registry(transport: Arc<dyn RestTransport>, config: RegistryConfig) -> Registry {
    Registry::new(
        transport,
        RegistryConfig {
            probe_on_register: false,
            ..config
        },
    )
}

// ─── Command implementations ─────────────────────────────────────────────────

fn cmd_chains(directory: &ChainDirectory) -> Result<()> {
    if directory.is_empty() {
        println!("No chains configured.");
        return Ok(());
    }
    println!("{:<20} {:<10} {:>4} {:>4}", "CHAIN", "PREFIX", "LCD", "RPC");
    for chain in directory.chains() {
        println!(
            "{:<20} {:<10} {:>4} {:>4}",
            chain.slug(),
            chain.addr_prefix.as_deref().unwrap_or("-"),
            chain.api.len(),
            chain.rpc.len()
        );
    }
    Ok(())
}

async fn cmd_get(
    registry: &Registry,
    directory: &ChainDirectory,
    chain: &str,
    path: &str,
    rpc: bool,
    attempts: Option<u32>,
) -> Result<()> {
    let service = directory.connect(registry, chain)?;
    let dispatcher = if rpc { &service.rpc } else { &service.api };
    let options = RequestOptions::default();

    let value = match attempts {
        Some(n) => dispatcher.request_with_attempts(path, &options, n).await,
        None => dispatcher.request(path, &options).await,
    }
    .with_context(|| format!("GET {path} on {}", dispatcher.name()))?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn cmd_probe(registry: &Registry, directory: &ChainDirectory, chain: &str) -> Result<()> {
    let service = probe_cycle(registry, directory, chain).await?;

    for dispatcher in [&service.api, &service.rpc] {
        println!("{} ({} endpoints)", dispatcher.name(), dispatcher.len());
        for ep in dispatcher.stats().endpoints {
            match ep.health {
                Some(h) => match h.error {
                    None => println!("  {:<10} {:>6}ms  {}", h.status, h.latency_ms, ep.address),
                    Some(reason) => println!(
                        "  {:<10} {:>8}  {}  ({reason})",
                        h.status, "-", ep.address
                    ),
                },
                None => println!("  {:<10} {:>8}  {}", "unprobed", "-", ep.address),
            }
        }
    }
    Ok(())
}

async fn cmd_stats(registry: &Registry, directory: &ChainDirectory, chain: &str) -> Result<()> {
    probe_cycle(registry, directory, chain).await?;
    let stats = registry
        .stats(&directory.find(chain)?.slug())
        .context("chain was not registered")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Register the chain and run one probe cycle on both dispatchers.
async fn probe_cycle(
    registry: &Registry,
    directory: &ChainDirectory,
    chain: &str,
) -> Result<Arc<ServiceDispatchers>> {
    let service = directory.connect(registry, chain)?;
    futures::future::join(service.api.probe_all(), service.rpc.probe_all()).await;
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chainlcd_core::{RestResponse, TransportError};
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RestTransport for CountingTransport {
        async fn get(
            &self,
            _url: &str,
            _options: &RequestOptions,
        ) -> Result<RestResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RestResponse::new(200, "{}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_cycle_hits_each_mirror_once() {
        let transport = Arc::new(CountingTransport { calls: AtomicUsize::new(0) });
        let registry = one_shot_registry(transport.clone(), RegistryConfig::default());
        let directory = public::directory();

        let service = probe_cycle(&registry, &directory, "cosmoshub").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        let mirrors = service.api.len() + service.rpc.len();
        assert_eq!(mirrors, 7);
        assert_eq!(transport.calls.load(Ordering::SeqCst), mirrors);

        registry.shutdown().await;
    }

    #[test]
    fn log_component_flag_is_repeatable() {
        let cli = Cli::try_parse_from([
            "chainlcd",
            "--log-component",
            "chainlcd-core=debug",
            "--log-component",
            "chainlcd-http=trace",
            "chains",
        ])
        .unwrap();
        assert_eq!(
            cli.log_components,
            [
                ("chainlcd-core".to_string(), "debug".to_string()),
                ("chainlcd-http".to_string(), "trace".to_string()),
            ]
        );
        assert!(Cli::try_parse_from(["chainlcd", "--log-component", "debug", "chains"]).is_err());
    }

    #[test]
    fn get_parses_flags() {
        let cli = Cli::try_parse_from([
            "chainlcd", "get", "osmosis", "/status", "--rpc", "--attempts", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Get { chain, path, rpc, attempts } => {
                assert_eq!(chain, "osmosis");
                assert_eq!(path, "/status");
                assert!(rpc);
                assert_eq!(attempts, Some(5));
            }
            _ => panic!("expected get"),
        }
    }
}
