//! HTTP error mapping.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::types::ApiResponse;
use crate::error_handling::{EnrichmentError, PipelineError, QueryError};

/// Errors a handler can return; each maps to a status code and an envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request itself is unusable (missing field, bad query parameter).
    #[error("{0}")]
    BadRequest(String),

    /// The multipart body exceeds the upload limit.
    #[error("upload exceeds the size limit")]
    PayloadTooLarge,

    /// Recognition or enrichment failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    /// HTTP status this error answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(PipelineError::Ocr(e)) if e.is_client_error() => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Pipeline(PipelineError::Ocr(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(PipelineError::Enrichment(EnrichmentError::Cancelled { .. })) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Pipeline(PipelineError::OcrNotConfigured)
            | ApiError::Pipeline(PipelineError::Enrichment(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("invalid upload: {}", error.body_text()))
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed ({status}): {self}");
        } else {
            log::warn!("Rejected request ({status}): {self}");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
