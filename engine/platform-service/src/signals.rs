//! Signal handling for graceful shutdown

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

/// Setup signal handlers for graceful shutdown.
///
/// The returned receiver resolves on the first Ctrl+C (SIGINT) or, on Unix,
/// SIGTERM.
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        use std::sync::atomic::{AtomicBool, Ordering};

        let sigterm_flag = Arc::new(AtomicBool::new(false));

        #[cfg(unix)]
        if let Err(e) =
            signal_hook::flag::register(signal_hook::consts::SIGTERM, sigterm_flag.clone())
        {
            error!("Failed to register SIGTERM handler: {}", e);
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    match result {
                        Ok(()) => info!("Ctrl+C signal received"),
                        Err(e) => error!("Failed to listen for Ctrl+C signal: {}", e),
                    }
                    break;
                }
                // signal_hook only sets a flag, so poll it
                _ = tokio::time::sleep(Duration::from_millis(100)) => {
                    if sigterm_flag.load(Ordering::Relaxed) {
                        info!("SIGTERM signal received");
                        break;
                    }
                }
            }
        }

        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}

/// Graceful shutdown handler
pub async fn graceful_shutdown(
    service_state: Arc<ServiceState>,
    gateway_handle: tokio::task::JoinHandle<()>,
) -> Result<()> {
    info!("Starting graceful shutdown...");

    service_state.stop_gateway().await;

    let shutdown_timeout = Duration::from_secs(service_state.config.service.shutdown_timeout_secs);
    match timeout(shutdown_timeout, gateway_handle).await {
        Ok(Ok(())) => {
            info!("ContentGateway stopped gracefully");
        }
        Ok(Err(e)) => {
            error!("ContentGateway task failed: {}", e);
        }
        Err(_) => {
            warn!("ContentGateway did not stop within timeout, forcing shutdown");
        }
    }

    info!("Graceful shutdown complete");
    Ok(())
}
