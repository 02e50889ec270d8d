use tokio::signal;
use tracing::{error, info};

/// Resolves on the first SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let (mut sigint, mut sigterm) = match (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "failed to install signal handlers, falling back to ctrl-c");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv()  => info!(signal = "SIGINT", "received shutdown signal"),
            _ = sigterm.recv() => info!(signal = "SIGTERM", "received shutdown signal"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!(signal = "ctrl-c", "received shutdown signal");
    }
}
