//! SimilarWeb total-traffic client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{with_retry, TrafficLookup};
use crate::config::{DEFAULT_MAX_RETRIES, SIMILARWEB_BASE_URL};
use crate::domain::DomainCandidate;
use crate::error_handling::{categorize_reqwest_error, categorize_status, LookupError};
use crate::initialization::RateLimiter;
use crate::models::{TrafficQuery, TrafficRecord, TrafficRequestMeta, VisitPoint, YearMonth};

const API_KEY_HEADER: &str = "api_key";
const ERROR_STATUS: &str = "Error";

#[derive(Debug, Deserialize)]
struct VisitsResponse {
    #[serde(default)]
    meta: ResponseMeta,
    #[serde(default)]
    visits: Vec<RawVisit>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMeta {
    #[serde(default)]
    request: RawRequest,
    status: Option<String>,
    error_message: Option<String>,
    last_updated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    granularity: Option<String>,
    main_domain_only: Option<bool>,
    mtd: Option<bool>,
    show_verified: Option<bool>,
    format: Option<String>,
    domain: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    country: Option<String>,
}

impl From<RawRequest> for TrafficRequestMeta {
    fn from(raw: RawRequest) -> Self {
        Self {
            domain: raw.domain.unwrap_or_default(),
            granularity: raw.granularity.unwrap_or_default(),
            main_domain_only: raw.main_domain_only.unwrap_or_default(),
            mtd: raw.mtd.unwrap_or_default(),
            show_verified: raw.show_verified.unwrap_or_default(),
            format: raw.format.unwrap_or_default(),
            start_date: raw.start_date.unwrap_or_default(),
            end_date: raw.end_date.unwrap_or_default(),
            country: raw.country.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVisit {
    date: String,
    // null when the provider has no estimate; kept as 0
    visits: Option<f64>,
}

/// Traffic lookup backed by the SimilarWeb REST API.
///
/// `GET {base}/v1/website/<host>/total-traffic-and-engagement/visits`, with the
/// key in the `api_key` header.
pub struct SimilarWebClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: usize,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl SimilarWebClient {
    /// Creates a client for the public API. An empty `api_key` fails every lookup without a request.
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: SIMILARWEB_BASE_URL.to_string(),
            api_key: api_key.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limiter: None,
        }
    }

    /// Points the client at another API host (test servers).
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

    async fn fetch_visits(
        &self,
        domain: &DomainCandidate,
        query: &TrafficQuery,
    ) -> Result<TrafficRecord, LookupError> {
        let url = format!(
            "{}/v1/website/{}/total-traffic-and-engagement/visits",
            self.base_url,
            domain.as_str()
        );
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&query_params(query))
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

        parse_visits(domain, query, &body)
    }
}

#[async_trait]
impl TrafficLookup for SimilarWebClient {
    async fn lookup_traffic(
        &self,
        domain: &DomainCandidate,
        query: &TrafficQuery,
    ) -> Result<TrafficRecord, LookupError> {
        if self.api_key.trim().is_empty() {
            return Err(LookupError::rejected("SimilarWeb API key is not configured"));
        }
        let label = format!("traffic lookup for {domain}");
        with_retry(
            self.max_retries,
            self.rate_limiter.as_deref(),
            &label,
            || self.fetch_visits(domain, query),
        )
        .await
    }
}

/// Query string for a traffic request. Flags and dates are only sent when set.
fn query_params(query: &TrafficQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("granularity", query.granularity.to_string())];
    if query.main_domain_only {
        params.push(("main_domain_only", "true".to_string()));
    }
    if query.month_to_date {
        params.push(("mtd", "true".to_string()));
    }
    if query.show_verified {
        params.push(("show_verified", "true".to_string()));
    }
    if !query.format.is_empty() {
        params.push(("format", query.format.clone()));
    }
    if let Some(start) = query.start_date {
        params.push(("start_date", start.to_string()));
    }
    if let Some(end) = query.end_date {
        params.push(("end_date", end.to_string()));
    }
    params.push(("country", query.country.to_string()));
    params
}

/// Decodes a visits body, keeping only points inside the requested month range.
fn parse_visits(
    domain: &DomainCandidate,
    query: &TrafficQuery,
    body: &str,
) -> Result<TrafficRecord, LookupError> {
    let response: VisitsResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(format!("visits body: {e}")))?;

    if response.meta.status.as_deref() == Some(ERROR_STATUS) {
        let message = response.meta.error_message.unwrap_or_default();
        if message.to_ascii_lowercase().contains("not found") {
            return Err(LookupError::NotFound {
                domain: domain.to_string(),
            });
        }
        return Err(LookupError::rejected(format!("provider error: {message}")));
    }

    let unbounded = query.start_date.is_none() && query.end_date.is_none();
    let total = response.visits.len();
    let visits: Vec<VisitPoint> = response
        .visits
        .into_iter()
        .filter_map(|raw| {
            let in_range = match YearMonth::from_date_prefix(&raw.date) {
                Some(month) => query.covers(month),
                None => unbounded,
            };
            in_range.then_some(VisitPoint {
                date: raw.date,
                visits: raw.visits.unwrap_or_default(),
            })
        })
        .collect();

    if visits.len() < total {
        log::debug!(
            "Dropped {} traffic point(s) for {domain} outside the requested range",
            total - visits.len()
        );
    }

    Ok(TrafficRecord {
        visits,
        request: response.meta.request.into(),
        status: response.meta.status,
        last_updated: response.meta.last_updated,
    })
}
