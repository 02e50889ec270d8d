use crate::cli::actions::Action;
use crate::exporter::new;
use anyhow::Result;

/// Serve the exporter until shutdown.
///
/// # Errors
///
/// Returns an error if the HTTP server cannot be started.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Run {
            port,
            listen,
            metrics_path,
            config,
        } => new(port, listen, metrics_path, config).await,
    }
}
