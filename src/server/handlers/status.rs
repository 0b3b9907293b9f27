//! JSON status handler.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use strum::IntoEnumIterator;

use super::super::types::{AppState, StatusResponse};
use crate::error_handling::LookupOutcome;
use crate::models::Source;

/// JSON status endpoint with lookup counters per source and outcome
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let enricher = state.pipeline.enricher();
    let stats = enricher.stats();

    let lookups = Source::iter()
        .map(|source| {
            let outcomes = LookupOutcome::iter()
                .map(|outcome| (outcome.as_str(), stats.get(source, outcome)))
                .collect::<BTreeMap<_, _>>();
            (source.as_str(), outcomes)
        })
        .collect();

    let response = StatusResponse {
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        ocr_enabled: state.pipeline.has_recognizer(),
        batches: stats.batches(),
        domains_analyzed: stats.domains(),
        failed_lookups: stats.total_failures(),
        available_lookup_slots: enricher.available_slots(),
        lookups,
    };

    (StatusCode::OK, Json(response)).into_response()
}
