//! Pitwall CLI - run the telemetry backend.
//!
//! Wires a telemetry source, the fuel history store and the WebSocket
//! endpoint together and runs the tick loop until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pitwall::broadcast::serve;
use pitwall::{Broadcaster, Config, JsonFileStore, SimulatedSource, TelemetryService};

#[derive(Debug, Parser)]
#[command(name = "pitwall", version, about = "Live sim-racing telemetry backend")]
struct Cli {
    /// Path to an INI config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to serve WebSocket subscribers on.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Tick period in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Fuel history file location.
    #[arg(long)]
    store: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<Config, pitwall::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config = config.with_bind_addr(bind);
    }
    if let Some(tick_ms) = cli.tick_ms {
        config = config.with_tick_interval_ms(tick_ms);
    }
    if let Some(store) = &cli.store {
        config = config.with_store_path(store.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration error");
            std::process::exit(2);
        }
    };
    info!(bind = %config.bind_addr, tick_ms = config.tick_interval_ms, "starting pitwall");

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %config.bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    let store = Arc::new(JsonFileStore::open(config.store_path.clone()).await);
    let broadcaster = Arc::new(Broadcaster::new());
    let source = SimulatedSource::new(config.tick_interval_ms);
    let service = TelemetryService::new(config, source, store, Arc::clone(&broadcaster));

    let shutdown = CancellationToken::new();
    let endpoint = tokio::spawn(serve(listener, broadcaster, shutdown.clone()));
    let ticker = tokio::spawn(service.run(shutdown.clone()));

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
    shutdown.cancel();
    let _ = ticker.await;
    let _ = endpoint.await;
}
