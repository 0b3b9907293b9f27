//! Graceful shutdown handling.

use tokio_util::sync::CancellationToken;

/// Cancels `token` on Ctrl-C.
///
/// Returns early, without cancelling, if `token` is cancelled by someone else.
pub async fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => {
                    log::info!("Received Ctrl-C, shutting down");
                    token.cancel();
                }
                Err(e) => {
                    log::error!("Failed to listen for Ctrl-C: {e}");
                    token.cancelled().await;
                }
            }
        }
        _ = token.cancelled() => {}
    }
}
