//! Long-running scheduler and worker loops.

pub mod scheduler;
pub mod worker;

use tokio_util::sync::CancellationToken;

/// Token cancelled on the first Ctrl-C / SIGINT.
pub fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        tracing::info!("shutdown signal received, finishing current work");
        trigger.cancel();
    });
    token
}
