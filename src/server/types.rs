//! Server state and response bodies.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::models::{DomainAnalysis, TrafficQuery};
use crate::pipeline::Pipeline;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    /// Extraction, OCR and enrichment
    pub pipeline: Arc<Pipeline>,
    /// Query applied to uploads that do not override it
    pub default_query: Arc<TrafficQuery>,
    /// Cancelled on server shutdown; each request runs under a child token
    pub shutdown: CancellationToken,
    /// For `uptime_seconds`
    pub start_time: Arc<Instant>,
    /// Directory holding `template/` and `static/`
    pub web_root: Arc<PathBuf>,
}

impl AppState {
    /// State with a private shutdown token.
    pub fn new(pipeline: Arc<Pipeline>, default_query: TrafficQuery, web_root: PathBuf) -> Self {
        Self {
            pipeline,
            default_query: Arc::new(default_query),
            shutdown: CancellationToken::new(),
            start_time: Arc::new(Instant::now()),
            web_root: Arc::new(web_root),
        }
    }

    /// Uses `shutdown` for graceful shutdown and per-request cancellation.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Response envelope: `data` on success (else `null`), `msg` describing problems.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Result, `null` on error
    pub data: Option<T>,
    /// Empty on full success, otherwise a summary of what went wrong
    pub msg: String,
}

impl<T> ApiResponse<T> {
    /// A successful response.
    pub fn success(data: T, msg: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            msg: msg.into(),
        }
    }

    /// An error response with `data: null`.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            data: None,
            msg: msg.into(),
        }
    }
}

/// Summary for the `msg` of a successful upload: empty when every lookup worked.
pub fn failure_summary(analyses: &[DomainAnalysis]) -> String {
    let failed_lookups: usize = analyses.iter().map(|a| a.failures().len()).sum();
    if failed_lookups == 0 {
        return String::new();
    }
    let affected = analyses.iter().filter(|a| !a.failures().is_empty()).count();
    format!("{failed_lookups} lookup(s) failed for {affected} of {} domain(s)", analyses.len())
}

/// JSON response for the `/status` endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Seconds since the server started
    pub uptime_seconds: f64,
    /// Whether uploads can be recognized
    pub ocr_enabled: bool,
    /// Upload batches enriched
    pub batches: usize,
    /// Domains enriched across all batches
    pub domains_analyzed: usize,
    /// Lookups that produced no record
    pub failed_lookups: usize,
    /// Free permits of the lookup limiter
    pub available_lookup_slots: usize,
    /// source -> outcome -> count
    pub lookups: BTreeMap<&'static str, BTreeMap<&'static str, usize>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainCandidate;
    use crate::error_handling::LookupError;

    fn failed(host: &str) -> DomainAnalysis {
        DomainAnalysis::from_lookups(
            DomainCandidate::parse(host).unwrap(),
            Err(LookupError::unavailable("down")),
            Err(LookupError::unavailable("down")),
        )
    }

    #[test]
    fn test_failure_summary() {
        assert_eq!(failure_summary(&[]), "");
        assert_eq!(
            failure_summary(&[failed("example.com"), failed("example.org")]),
            "4 lookup(s) failed for 2 of 2 domain(s)"
        );
    }

    #[test]
    fn test_error_envelope_has_null_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error("bad")).unwrap();
        assert!(body["data"].is_null());
        assert_eq!(body["msg"], "bad");
    }
}
