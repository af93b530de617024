//! Smart-card reader protocol proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Reader client             ┌──────────────────────────────────────────────┐
//!   (line protocol)           │                 SIMONA PROXY                  │
//!  ───────────────────────────┼─▶ net::listener ─▶ net::session (per conn)  │
//!                             │                      │                        │
//!                             │                      ▼                        │
//!                             │               protocol::parser               │
//!                             │                      │                        │
//!                             │                      ▼                        │
//!                             │            dispatch::dispatcher ──────────────┼──▶ Reader gateway
//!                             │                      │         gateway::client│     (HTTP GET)
//!  ◀──────────────────────────┼──── protocol::reply ◀┘                        │
//!   >id:data@@                └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use simona_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use simona_proxy::lifecycle::{shutdown_signal, Shutdown};
use simona_proxy::observability::{logging, metrics};
use simona_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "simona-proxy")]
#[command(about = "Line-protocol to REST proxy for remote smart-card readers", long_about = None)]
struct Args {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long, env = "SIMONA_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_host.
    #[arg(long, env = "SIMONA_PROXY_BIND_HOST")]
    bind_host: Option<String>,

    /// Override listener.bind_port.
    #[arg(short, long, env = "SIMONA_PROXY_PORT")]
    port: Option<u16>,

    /// Answer APDU/RESET with simulated card responses.
    #[arg(long)]
    simulate_card: bool,
}

fn load(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(host) = &args.bind_host {
        config.listener.bind_host = host.clone();
    }
    if let Some(port) = args.port {
        config.listener.bind_port = port;
    }
    if args.simulate_card {
        config.card.simulate = true;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load(&args)?;

    logging::init(&config.observability.log_level);
    tracing::info!("simona-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        max_sessions = config.listener.max_sessions,
        gateway = %config.gateway.url,
        simulate_card = config.card.simulate,
        local_reader_override = config.card.local_reader_override,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = ProxyServer::new(config)?;
    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Bind failed");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    let accept_loop = server.run(listener, shutdown.subscribe());
    tokio::pin!(accept_loop);

    let signalled = tokio::select! {
        _ = &mut accept_loop => false,
        _ = shutdown_signal() => true,
    };
    if signalled {
        shutdown.trigger();
        accept_loop.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
