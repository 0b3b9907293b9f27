//! Concurrent enrichment of domain candidates.
//!
//! For every domain the archive and traffic lookups run concurrently, and all
//! domains of a batch fan out at once. A semaphore shared by every batch the
//! `Enricher` serves bounds the number of lookups in flight. Each lookup gets
//! its own timeout, counted from the moment it holds a limiter slot.
//!
//! Failures are contained per (domain, source): they leave the record empty and
//! add a `LookupFailure`, and never fail the batch. Only cancellation does.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::{DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENCY};
use crate::domain::DomainCandidate;
use crate::error_handling::{EnrichmentError, LookupError, LookupStats};
use crate::initialization::init_semaphore;
use crate::lookup::{ArchiveLookup, TrafficLookup};
use crate::models::{
    AnalysisOutcome, AnalysisThresholds, Assessment, DomainAnalysis, Source, TrafficQuery,
};

/// Fan-out limits of an [`Enricher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentOptions {
    /// Maximum lookups in flight across all batches (at least 1)
    pub max_concurrency: usize,
    /// Budget for a single lookup, retries included
    pub lookup_timeout: Duration,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        }
    }
}

/// Enrichment orchestrator.
///
/// Built once at start-up with its two lookup ports and shared by every request.
pub struct Enricher {
    archive: Arc<dyn ArchiveLookup>,
    traffic: Arc<dyn TrafficLookup>,
    limiter: Arc<Semaphore>,
    lookup_timeout: Duration,
    stats: Arc<LookupStats>,
    thresholds: Option<AnalysisThresholds>,
}

impl Enricher {
    /// Creates an orchestrator over the two lookup ports.
    pub fn new(
        archive: Arc<dyn ArchiveLookup>,
        traffic: Arc<dyn TrafficLookup>,
        options: EnrichmentOptions,
    ) -> Self {
        Self {
            archive,
            traffic,
            limiter: init_semaphore(options.max_concurrency),
            lookup_timeout: options.lookup_timeout,
            stats: Arc::new(LookupStats::new()),
            thresholds: None,
        }
    }

    /// Records outcomes into `stats` instead of a private counter set.
    pub fn with_stats(mut self, stats: Arc<LookupStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Attaches an assessment to every analysis when thresholds are given.
    pub fn with_thresholds(mut self, thresholds: Option<AnalysisThresholds>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Outcome counters shared with `/status` and `/metrics`.
    pub fn stats(&self) -> &Arc<LookupStats> {
        &self.stats
    }

    /// Limiter slots currently free.
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Enriches `domains` and returns one analysis per domain, in input order.
    ///
    /// # Errors
    ///
    /// Returns `EnrichmentError::Cancelled` when `cancel` fires before every
    /// domain completes. In-flight lookups are dropped, their limiter slots are
    /// released and already-completed analyses are discarded.
    pub async fn enrich(
        &self,
        domains: &[DomainCandidate],
        query: &TrafficQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<DomainAnalysis>, EnrichmentError> {
        let total = domains.len();
        let now = Utc::now();
        self.stats.record_batch();
        log::info!("Enriching {total} domain(s)");

        let mut pending: FuturesUnordered<_> = domains
            .iter()
            .enumerate()
            .map(|(index, domain)| async move { (index, self.analyze_one(domain, query, now).await) })
            .collect();

        let mut slots: Vec<Option<DomainAnalysis>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!("Enrichment cancelled after {completed} of {total} domain(s)");
                    return Err(EnrichmentError::Cancelled { completed, total });
                }
                next = pending.next() => match next {
                    Some((index, analysis)) => {
                        self.stats.record_analysis(&analysis);
                        slots[index] = Some(analysis);
                        completed += 1;
                    }
                    None => break,
                }
            }
        }

        let results: Vec<DomainAnalysis> = slots.into_iter().flatten().collect();
        log_summary(&results);
        Ok(results)
    }

    async fn analyze_one(
        &self,
        domain: &DomainCandidate,
        query: &TrafficQuery,
        now: DateTime<Utc>,
    ) -> DomainAnalysis {
        let (archive, traffic) = tokio::join!(
            self.guarded(
                Source::Archive,
                domain,
                self.archive.lookup_earliest_capture(domain)
            ),
            self.guarded(
                Source::Traffic,
                domain,
                self.traffic.lookup_traffic(domain, query)
            ),
        );

        let analysis = DomainAnalysis::from_lookups(domain.clone(), archive, traffic);
        log::debug!("{domain}: {:?}", analysis.outcome());

        match &self.thresholds {
            Some(thresholds) => {
                let assessment =
                    Assessment::evaluate(analysis.archive(), analysis.traffic(), thresholds, now);
                analysis.with_assessment(assessment)
            }
            None => analysis,
        }
    }

    /// Runs one lookup under a limiter slot and the per-lookup timeout.
    async fn guarded<T, F>(
        &self,
        source: Source,
        domain: &DomainCandidate,
        lookup: F,
    ) -> Result<T, LookupError>
    where
        F: Future<Output = Result<T, LookupError>>,
    {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| LookupError::rejected("lookup limiter closed"))?;

        let result = tokio::time::timeout(self.lookup_timeout, lookup)
            .await
            .unwrap_or_else(|_| Err(LookupError::timed_out(self.lookup_timeout)));

        match &result {
            Err(LookupError::NotFound { .. }) => {
                log::debug!("{source} lookup for {domain}: no data");
            }
            Err(e) => log::warn!("{source} lookup for {domain} failed: {e}"),
            Ok(_) => {}
        }
        result
    }
}

fn log_summary(results: &[DomainAnalysis]) {
    let count = |outcome: AnalysisOutcome| results.iter().filter(|a| a.outcome() == outcome).count();
    log::info!(
        "Enriched {} domain(s): {} complete, {} partial, {} failed",
        results.len(),
        count(AnalysisOutcome::Complete),
        count(AnalysisOutcome::Partial),
        count(AnalysisOutcome::Failed)
    );
}
