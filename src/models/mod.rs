//! Data model shared by the extractor, the lookup ports and the orchestrator.

mod assessment;
mod query;
mod records;

pub use assessment::{AnalysisThresholds, Assessment};
pub use query::{Country, Granularity, QueryOverrides, TrafficQuery, YearMonth, JSON_FORMAT};
pub use records::{
    AnalysisOutcome, ArchiveRecord, DomainAnalysis, LookupFailure, Source, TrafficRecord,
    TrafficRequestMeta, VisitPoint,
};
