//! HTTP front door.
//!
//! Routes:
//! - `GET /` - Upload page
//! - `/static/*` - Page assets
//! - `POST /upload` - Multipart screenshot upload, returns the domain analyses
//! - `GET /status` - JSON lookup statistics
//! - `GET /metrics` - Prometheus-compatible metrics
//!
//! Every response except the page and assets uses the `{data, msg}` envelope.

mod error;
mod handlers;
mod types;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::MAX_UPLOAD_BYTES;
use handlers::{index_handler, metrics_handler, status_handler, upload_handler};

pub use error::ApiError;
pub use types::{failure_summary, ApiResponse, AppState, StatusResponse};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let static_dir = state.web_root.join("static");
    Router::new()
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Binds the listen socket on all interfaces.
pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind server to port {port}"))
}

/// Serves requests until `state.shutdown` is cancelled.
///
/// Uploads run under a child of that token, so lookups still in flight at
/// shutdown are cancelled and those requests answer 503 before the server exits.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener
        .local_addr()
        .context("Failed to read listen address")?;
    log::info!("Server listening on http://{addr}/");
    log::info!("  - Upload: POST http://{addr}/upload");
    log::info!("  - Status: http://{addr}/status");
    log::info!("  - Metrics: http://{addr}/metrics");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    log::info!("Server stopped");
    Ok(())
}
