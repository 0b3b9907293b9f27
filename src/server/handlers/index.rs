//! Upload page.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::super::types::AppState;

/// Serves `template/index.html` from the web root.
pub async fn index_handler(State(state): State<AppState>) -> Response {
    let path = state.web_root.join("template").join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            (StatusCode::NOT_FOUND, "upload page not found").into_response()
        }
    }
}
