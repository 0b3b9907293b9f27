//! Lookup statistics tracking.
//!
//! This module provides thread-safe counters for lookup outcomes per source,
//! plus batch and domain totals. The counters live for the whole process and
//! back the `/status` and `/metrics` endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;

use super::types::LookupOutcome;
use crate::models::{DomainAnalysis, Source};

/// Thread-safe lookup statistics tracker.
///
/// Every (source, outcome) pair is initialized to zero on creation, so the map
/// is never written after construction and needs no lock.
pub struct LookupStats {
    outcomes: HashMap<(Source, LookupOutcome), AtomicUsize>,
    batches: AtomicUsize,
    domains: AtomicUsize,
}

impl LookupStats {
    /// Creates a counter set with every source and outcome at zero.
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for source in Source::iter() {
            for outcome in LookupOutcome::iter() {
                outcomes.insert((source, outcome), AtomicUsize::new(0));
            }
        }

        LookupStats {
            outcomes,
            batches: AtomicUsize::new(0),
            domains: AtomicUsize::new(0),
        }
    }

    /// Increment the counter for one lookup outcome.
    pub fn record(&self, source: Source, outcome: LookupOutcome) {
        if let Some(counter) = self.outcomes.get(&(source, outcome)) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for ({source}, {outcome}) which is not in the map. \
                 This indicates a bug in LookupStats initialization."
            );
        }
    }

    /// Record both lookups of a finished analysis.
    pub fn record_analysis(&self, analysis: &DomainAnalysis) {
        self.domains.fetch_add(1, Ordering::Relaxed);
        for source in Source::iter() {
            let outcome = analysis
                .failure(source)
                .map(|failure| LookupOutcome::from(failure.kind))
                .unwrap_or(LookupOutcome::Success);
            self.record(source, outcome);
        }
    }

    /// Record the start of one enrichment batch.
    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Count of lookups against `source` that ended with `outcome`.
    pub fn get(&self, source: Source, outcome: LookupOutcome) -> usize {
        self.outcomes
            .get(&(source, outcome))
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Total lookups against `source`, any outcome.
    pub fn total_for(&self, source: Source) -> usize {
        LookupOutcome::iter().map(|o| self.get(source, o)).sum()
    }

    /// Total failed lookups across both sources.
    pub fn total_failures(&self) -> usize {
        Source::iter()
            .flat_map(|s| {
                LookupOutcome::iter()
                    .filter(|o| *o != LookupOutcome::Success)
                    .map(move |o| (s, o))
            })
            .map(|(s, o)| self.get(s, o))
            .sum()
    }

    /// Number of `enrich` calls started.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }

    /// Number of domains submitted across all batches.
    pub fn domains(&self) -> usize {
        self.domains.load(Ordering::Relaxed)
    }
}

impl Default for LookupStats {
    fn default() -> Self {
        Self::new()
    }
}
