//! Shutdown handling for graceful daemon termination
//!
//! The ramp is parked before the daemon exits: the motor returns to its
//! starting position and the driver is put to sleep, disabled and released so
//! the motor cannot overheat while nobody controls it.

use ramp_hardware::{OutputPin, Ramp};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Wait for Ctrl+C or SIGTERM
///
/// A signal whose handler cannot be installed is never reported.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

/// Forward the first shutdown signal to `sender`
pub(crate) fn spawn_signal_listener(sender: watch::Sender<bool>) {
    tokio::spawn(async move {
        shutdown_signal().await;
        // the session may already be gone
        let _ = sender.send(true);
    });
}

/// Park the ramp and release the hardware
pub(crate) async fn park<P: OutputPin>(ramp: Ramp<P>) {
    info!("Parking ramp...");
    match ramp.shutdown().await {
        Ok(()) => info!("Ramp parked"),
        Err(e) => warn!("Failed to park ramp: {}", e),
    }
}
