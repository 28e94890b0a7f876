//! # Tintworks — Window-Tinting Storefront Backend
//!
//! Serves the service catalog, delegates checkout to the hosted payment
//! processor, records paid orders from signed webhooks, sends transactional
//! email, and answers FAQ chat queries.
//!
//! Usage:
//!   tintworks                         # Start the server (default port 3000)
//!   tintworks --port 8080             # Custom port
//!   tintworks --config ./shop.toml    # Explicit config file

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tintworks_core::TintworksConfig;

#[derive(Parser)]
#[command(
    name = "tintworks",
    version,
    about = "Tintworks — window-tinting storefront backend"
)]
struct Cli {
    /// Server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Config file path (default: ~/.tintworks/config.toml, or TINTWORKS_CONFIG)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tintworks=debug,tintworks_gateway=debug,tower_http=debug"
    } else {
        "tintworks=info,tintworks_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Resolve config path: CLI flag > env var > default location
    let config_path = cli
        .config
        .or_else(|| std::env::var("TINTWORKS_CONFIG").ok())
        .map(|p| PathBuf::from(shellexpand::tilde(&p).to_string()));

    let mut config = match config_path {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            TintworksConfig::load_from(&path)?
        }
        None => TintworksConfig::load()?,
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }

    tintworks_gateway::start(config).await
}
