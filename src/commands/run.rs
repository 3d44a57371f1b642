//! `issue-mirror run` command.

use tracing::error;

use crate::daemon;
use crate::service::MirrorService;

/// Mirrors until Ctrl-C.
///
/// # Errors
///
/// Returns an error string if the Discord token is missing.
pub async fn run(service: &MirrorService) -> Result<(), String> {
    service.config().require_discord_token().map_err(|e| e.to_string())?;
    daemon::run_until(service, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C; stop the process to exit");
        std::future::pending::<()>().await;
    }
}
