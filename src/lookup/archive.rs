//! Wayback Machine CDX client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::StatusCode;

use super::{with_retry, ArchiveLookup};
use crate::config::{CDX_TIMESTAMP_FORMAT, DEFAULT_MAX_RETRIES, WAYBACK_BASE_URL};
use crate::domain::DomainCandidate;
use crate::error_handling::{categorize_reqwest_error, categorize_status, LookupError};
use crate::initialization::RateLimiter;
use crate::models::ArchiveRecord;

const CDX_PATH: &str = "/cdx/search/cdx";

/// Archive lookup backed by the Internet Archive CDX API.
///
/// Asks for the single oldest capture of the host:
/// `GET {base}/cdx/search/cdx?url=<host>&output=json&fl=timestamp,original&sort=timestamp&limit=1`
pub struct WaybackClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: usize,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl WaybackClient {
    /// Creates a client against the public Wayback Machine.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: WAYBACK_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limiter: None,
        }
    }

    /// Points the client at another CDX host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Retries after the first attempt for transient failures.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Waits on `rate_limiter` before every request, when set.
    pub fn with_rate_limiter(mut self, rate_limiter: Option<Arc<RateLimiter>>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    async fn fetch_earliest(&self, domain: &DomainCandidate) -> Result<ArchiveRecord, LookupError> {
        let url = format!("{}{}", self.base_url, CDX_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("url", domain.as_str()),
                ("output", "json"),
                ("fl", "timestamp,original"),
                ("sort", "timestamp"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound {
                domain: domain.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        if !status.is_success() {
            return Err(categorize_status(status, &body));
        }

        parse_cdx_rows(domain, &body)
    }
}

#[async_trait]
impl ArchiveLookup for WaybackClient {
    async fn lookup_earliest_capture(
        &self,
        domain: &DomainCandidate,
    ) -> Result<ArchiveRecord, LookupError> {
        let label = format!("archive lookup for {domain}");
        with_retry(
            self.max_retries,
            self.rate_limiter.as_deref(),
            &label,
            || self.fetch_earliest(domain),
        )
        .await
    }
}

/// Decodes a CDX JSON body into the earliest capture.
///
/// The body is an array of string rows: a header row followed by at most one
/// capture row `[timestamp, original]`. No capture row means the archive has
/// never seen the domain.
pub fn parse_cdx_rows(domain: &DomainCandidate, body: &str) -> Result<ArchiveRecord, LookupError> {
    let not_found = || LookupError::NotFound {
        domain: domain.to_string(),
    };

    if body.trim().is_empty() {
        return Err(not_found());
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(format!("CDX body is not a row array: {e}")))?;

    let Some(row) = rows.get(1) else {
        return Err(not_found());
    };

    let [timestamp, original, ..] = row.as_slice() else {
        return Err(LookupError::MalformedResponse(format!(
            "CDX row has {} field(s), expected 2",
            row.len()
        )));
    };

    let captured_at = NaiveDateTime::parse_from_str(timestamp, CDX_TIMESTAMP_FORMAT)
        .map_err(|e| {
            LookupError::MalformedResponse(format!("invalid CDX timestamp '{timestamp}': {e}"))
        })?
        .and_utc();

    Ok(ArchiveRecord {
        captured_at,
        original: original.clone(),
    })
}
