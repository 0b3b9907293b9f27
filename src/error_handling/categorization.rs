//! Error categorization and retry strategy.
//!
//! This module maps provider transport failures onto the lookup error taxonomy
//! and configures the retry strategy used by the provider clients.

use std::time::Duration;

use reqwest::StatusCode;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::LookupError;
use crate::config::{
    HTTP_STATUS_TOO_MANY_REQUESTS, RETRY_BACKOFF_BASE, RETRY_FACTOR_MS, RETRY_MAX_DELAY_SECS,
};

/// Longest provider body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Creates an exponential backoff retry strategy.
///
/// Delays start at `RETRY_BACKOFF_BASE * RETRY_FACTOR_MS` milliseconds and double
/// each retry, capped at `RETRY_MAX_DELAY_SECS`. The iterator yields
/// `max_retries` delays, i.e. `max_retries + 1` attempts in total.
pub fn get_retry_strategy(max_retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(RETRY_BACKOFF_BASE)
        .factor(RETRY_FACTOR_MS)
        .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
        .take(max_retries)
}

/// Categorizes a `reqwest::Error` into a `LookupError`.
///
/// Timeouts, connection and request failures are transient and retriable.
/// Decode failures mean the provider answered with something unreadable.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> LookupError {
    if let Some(status) = error.status() {
        return categorize_status(status, "");
    }

    if error.is_decode() {
        LookupError::MalformedResponse(error.to_string())
    } else if error.is_builder() || error.is_redirect() {
        LookupError::rejected(error.to_string())
    } else if error.is_timeout() {
        LookupError::unavailable(format!("request timed out: {error}"))
    } else if error.is_connect() {
        LookupError::unavailable(format!("connection failed: {error}"))
    } else {
        LookupError::unavailable(error.to_string())
    }
}

/// Categorizes a non-success HTTP status.
///
/// 429 and 5xx are retriable. Any other status is a refusal that will not
/// change on retry. 404 is left to the caller, since only it knows which domain
/// was missing.
pub fn categorize_status(status: StatusCode, body: &str) -> LookupError {
    let excerpt = body_excerpt(body);
    let reason = if excerpt.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {excerpt}")
    };

    if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS || status.is_server_error() {
        LookupError::unavailable(reason)
    } else {
        LookupError::rejected(reason)
    }
}

/// Truncates a provider body for inclusion in an error message.
fn body_excerpt(body: &str) -> &str {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}
