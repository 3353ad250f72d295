//! Content Platform Engagement Service
//!
//! Main entry point: loads configuration, wires the storage backend to the
//! engagement engines, serves the REST gateway, and handles graceful
//! shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use platform_service::{
    graceful_shutdown, initialize_logging, load_configuration, setup_signal_handlers, ServiceState,
};

#[derive(Debug, Parser)]
#[command(name = "content-platform", about = "Content platform engagement service")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = load_configuration(args.config.as_deref()).context("Failed to load configuration")?;
    initialize_logging(&config.logging)?;

    info!("Starting Content Platform Service v{}", env!("CARGO_PKG_VERSION"));

    let service_state = Arc::new(ServiceState::new(config).await?);
    info!("Service state initialized");

    let shutdown_signal = setup_signal_handlers()?;
    info!("Signal handlers configured");

    let gateway_handle = {
        let state = service_state.clone();
        tokio::spawn(async move {
            if let Err(e) = state.start_gateway().await {
                error!("ContentGateway failed: {}", e);
            }
        })
    };

    info!("Content Platform Service is running. Press Ctrl+C to shutdown gracefully.");
    let _ = shutdown_signal.await;

    info!("Shutdown signal received. Initiating graceful shutdown...");
    graceful_shutdown(service_state, gateway_handle).await?;

    info!("Content Platform Service shutdown complete");
    Ok(())
}
