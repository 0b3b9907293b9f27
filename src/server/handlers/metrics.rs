//! Prometheus metrics handler.

use std::fmt::Write as _;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use strum::IntoEnumIterator;

use super::super::types::AppState;
use crate::error_handling::LookupOutcome;
use crate::models::Source;

/// Prometheus-compatible metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let enricher = state.pipeline.enricher();
    let stats = enricher.stats();

    let mut metrics = format!(
        r#"# HELP domain_analyzer_uptime_seconds Seconds since the server started
# TYPE domain_analyzer_uptime_seconds gauge
domain_analyzer_uptime_seconds {}

# HELP domain_analyzer_batches_total Number of enrichment batches started
# TYPE domain_analyzer_batches_total counter
domain_analyzer_batches_total {}

# HELP domain_analyzer_domains_total Number of domains analyzed
# TYPE domain_analyzer_domains_total counter
domain_analyzer_domains_total {}

# HELP domain_analyzer_lookup_slots_available Free lookup concurrency slots
# TYPE domain_analyzer_lookup_slots_available gauge
domain_analyzer_lookup_slots_available {}

# HELP domain_analyzer_lookups_total Provider lookups by source and outcome
# TYPE domain_analyzer_lookups_total counter
"#,
        state.start_time.elapsed().as_secs_f64(),
        stats.batches(),
        stats.domains(),
        enricher.available_slots(),
    );

    for source in Source::iter() {
        for outcome in LookupOutcome::iter() {
            let _ = writeln!(
                metrics,
                "domain_analyzer_lookups_total{{source=\"{source}\",outcome=\"{outcome}\"}} {}",
                stats.get(source, outcome)
            );
        }
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
        .into_response()
}
