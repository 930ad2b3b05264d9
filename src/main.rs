//! OCS gateway
//!
//! Serves the Open Collaboration Services endpoint on Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ ocs::dispatcher ──▶ routing::router
//!                                            │
//!                                            ▼
//!                                      ocs::handlers ──▶ ocs::params / ocs::auth
//!                                            │
//!                                            ▼
//!                                  backends (under resilience deadline)
//!                                            │
//!     Client Response                        ▼
//!     ◀────────────── http::response ◀── ocs::serializer
//!
//!     Cross-cutting: config, observability (logs, metrics), lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use ocs_gateway::config::{load_config, GatewayConfig};
use ocs_gateway::http::HttpServer;
use ocs_gateway::lifecycle::{build_services, signals, Shutdown};
use ocs_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ocs-gateway")]
#[command(about = "Open Collaboration Services endpoint", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("ocs-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.ocs.base_path,
        accounts = config.accounts.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let services = build_services(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, services.collaborators)?;
    server.run(listener, shutdown.subscribe()).await?;

    if let Err(e) = services.preferences.save_to_file() {
        tracing::error!(error = %e, "Failed to save preferences");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
