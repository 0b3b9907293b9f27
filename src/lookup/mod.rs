//! Archive and traffic lookup ports and their HTTP adapters.
//!
//! The orchestrator only sees the two traits below. The adapters own their
//! HTTP client, retry policy and optional rate limiter.
//!
//! Key items:
//! - `ArchiveLookup` - Earliest web-archive capture of a domain
//! - `TrafficLookup` - Historical visit series of a domain
//! - `WaybackClient` / `SimilarWebClient` - Production adapters

mod archive;
mod traffic;

use std::future::Future;

use async_trait::async_trait;
use tokio_retry::RetryIf;

use crate::domain::DomainCandidate;
use crate::error_handling::{get_retry_strategy, LookupError};
use crate::initialization::RateLimiter;
use crate::models::{ArchiveRecord, TrafficQuery, TrafficRecord};

pub use archive::{parse_cdx_rows, WaybackClient};
pub use traffic::SimilarWebClient;

/// Source of earliest-capture records.
#[async_trait]
pub trait ArchiveLookup: Send + Sync {
    /// Returns the earliest known capture of `domain`.
    ///
    /// `LookupError::NotFound` means the archive has never seen the domain.
    async fn lookup_earliest_capture(
        &self,
        domain: &DomainCandidate,
    ) -> Result<ArchiveRecord, LookupError>;
}

/// Source of historical traffic series.
#[async_trait]
pub trait TrafficLookup: Send + Sync {
    /// Returns the visit series of `domain` scoped by `query`.
    async fn lookup_traffic(
        &self,
        domain: &DomainCandidate,
        query: &TrafficQuery,
    ) -> Result<TrafficRecord, LookupError>;
}

/// Runs `attempt` until it succeeds, fails with a non-retriable error, or the
/// retry budget is spent. Each attempt first waits on the rate limiter, if any.
pub(crate) async fn with_retry<T, F, Fut>(
    max_retries: usize,
    rate_limiter: Option<&RateLimiter>,
    label: &str,
    mut attempt: F,
) -> Result<T, LookupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LookupError>>,
{
    let mut attempts = 0usize;
    RetryIf::spawn(
        get_retry_strategy(max_retries),
        || {
            attempts += 1;
            if attempts > 1 {
                log::debug!("Retrying {label} (attempt {attempts})");
            }
            let request = attempt();
            async move {
                if let Some(limiter) = rate_limiter {
                    limiter.acquire().await;
                }
                request.await
            }
        },
        |error: &LookupError| error.is_retriable(),
    )
    .await
}
