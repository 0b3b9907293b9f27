//! Lookup records and the per-domain analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::EnumIter;

use super::assessment::Assessment;
use crate::domain::DomainCandidate;
use crate::error_handling::{FailureKind, LookupError};

/// Earliest known capture of a domain in the web archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRecord {
    /// Capture time (UTC)
    pub captured_at: DateTime<Utc>,
    /// URL as it was originally captured
    pub original: String,
}

/// One dated point of a traffic series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitPoint {
    /// Provider date, e.g. `2023-01-01`
    pub date: String,
    /// Estimated visits for the period
    pub visits: f64,
}

/// Request metadata echoed back by the traffic provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficRequestMeta {
    /// Domain the provider resolved
    pub domain: String,
    /// Granularity as the provider spells it
    pub granularity: String,
    /// Whether subdomains were excluded
    pub main_domain_only: bool,
    /// Month-to-date flag
    pub mtd: bool,
    /// Verified-data flag
    pub show_verified: bool,
    /// Response format
    pub format: String,
    /// First date covered
    pub start_date: String,
    /// Last date covered
    pub end_date: String,
    /// Country code or `world`
    pub country: String,
}

/// Historical traffic for one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    /// Dated visit counts, in provider order
    pub visits: Vec<VisitPoint>,
    /// Echo of the request the provider answered
    pub request: TrafficRequestMeta,
    /// Provider status string (e.g. `Success`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// When the provider last refreshed this data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl TrafficRecord {
    /// Mean visits across the series, `None` for an empty series.
    pub fn average_visits(&self) -> Option<f64> {
        if self.visits.is_empty() {
            return None;
        }
        let total: f64 = self.visits.iter().map(|point| point.visits).sum();
        Some(total / self.visits.len() as f64)
    }
}

/// External source consulted for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Web archive (earliest capture)
    Archive,
    /// Traffic statistics
    Traffic,
}

impl Source {
    /// Lower-case name used in JSON and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Archive => "archive",
            Source::Traffic => "traffic",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lookup that produced no usable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupFailure {
    /// Lookup that failed
    pub source: Source,
    /// Failure category
    pub kind: FailureKind,
    /// Provider or transport detail
    pub message: String,
}

impl LookupFailure {
    /// Records `error` as the failure of the `source` lookup.
    pub fn new(source: Source, error: &LookupError) -> Self {
        Self {
            source,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// How much of a domain's enrichment succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Both records present
    Complete,
    /// Exactly one record present
    Partial,
    /// Neither record present
    Failed,
}

/// Enrichment result for a single domain.
///
/// Built once by the orchestrator from the two lookup results. A failed lookup
/// leaves its record slot empty and adds an entry to `failures`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainAnalysis {
    domain: DomainCandidate,
    archive: Option<ArchiveRecord>,
    traffic: Option<TrafficRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<LookupFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assessment: Option<Assessment>,
}

impl DomainAnalysis {
    /// Assembles an analysis from the raw outcome of both lookups.
    pub fn from_lookups(
        domain: DomainCandidate,
        archive: Result<ArchiveRecord, LookupError>,
        traffic: Result<TrafficRecord, LookupError>,
    ) -> Self {
        let mut failures = Vec::new();
        let archive = archive
            .map_err(|e| failures.push(LookupFailure::new(Source::Archive, &e)))
            .ok();
        let traffic = traffic
            .map_err(|e| failures.push(LookupFailure::new(Source::Traffic, &e)))
            .ok();
        Self {
            domain,
            archive,
            traffic,
            failures,
            assessment: None,
        }
    }

    /// Attaches a threshold assessment.
    pub fn with_assessment(mut self, assessment: Assessment) -> Self {
        self.assessment = Some(assessment);
        self
    }

    /// The analyzed host.
    pub fn domain(&self) -> &DomainCandidate {
        &self.domain
    }

    /// Earliest capture, when the archive lookup succeeded.
    pub fn archive(&self) -> Option<&ArchiveRecord> {
        self.archive.as_ref()
    }

    /// Visit series, when the traffic lookup succeeded.
    pub fn traffic(&self) -> Option<&TrafficRecord> {
        self.traffic.as_ref()
    }

    /// Failed lookups, archive first.
    pub fn failures(&self) -> &[LookupFailure] {
        &self.failures
    }

    /// Threshold flags, when thresholds are configured.
    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    /// Failure recorded for `source`, if that lookup failed.
    pub fn failure(&self, source: Source) -> Option<&LookupFailure> {
        self.failures.iter().find(|failure| failure.source == source)
    }

    /// Which lookups produced a record.
    pub fn outcome(&self) -> AnalysisOutcome {
        match (self.archive.is_some(), self.traffic.is_some()) {
            (true, true) => AnalysisOutcome::Complete,
            (false, false) => AnalysisOutcome::Failed,
            _ => AnalysisOutcome::Partial,
        }
    }
}
