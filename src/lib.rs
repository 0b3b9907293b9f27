//! domain_analyzer library: domain recognition and enrichment
//!
//! This library pulls candidate domain names out of free text (typically the
//! OCR output of a screenshot) and enriches each one with two independent
//! lookups: the earliest Wayback Machine capture and the SimilarWeb visit
//! history. Lookups for different domains run concurrently under a shared
//! ceiling, and a failed lookup never hides the other lookup's result.
//!
//! # Example
//!
//! ```no_run
//! use domain_analyzer::{build_pipeline, AppConfig, TrafficQuery};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let pipeline = build_pipeline(&config)?;
//!
//! let lines = ["Visit example.com today!", "docs at https://www.rust-lang.org/learn"];
//! let analyses = pipeline
//!     .analyze(&lines[..], &TrafficQuery::default(), &CancellationToken::new())
//!     .await?;
//! for analysis in &analyses {
//!     println!("{}: {:?}", analysis.domain(), analysis.outcome());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod app;
pub mod config;
mod domain;
mod enrichment;
mod error_handling;
pub mod initialization;
mod lookup;
mod models;
mod ocr;
mod pipeline;
mod run;
mod server;

// Re-export public API
pub use config::{AppConfig, LogFormat, LogLevel};
pub use domain::{extract_domains, is_allowed_tld, DomainCandidate};
pub use enrichment::{Enricher, EnrichmentOptions};
pub use error_handling::{
    ConfigError, EnrichmentError, FailureKind, InitializationError, LookupError, LookupOutcome,
    LookupStats, OcrError, PipelineError, QueryError,
};
pub use lookup::{parse_cdx_rows, ArchiveLookup, SimilarWebClient, TrafficLookup, WaybackClient};
pub use models::{
    AnalysisOutcome, AnalysisThresholds, ArchiveRecord, Assessment, Country, DomainAnalysis,
    Granularity, LookupFailure, QueryOverrides, Source, TrafficQuery, TrafficRecord,
    TrafficRequestMeta, VisitPoint, YearMonth,
};
pub use ocr::{check_image, sniff_image_format, ImageFormat, TencentCredentials, TencentOcr, TextRecognizer};
pub use pipeline::Pipeline;
pub use run::{build_pipeline, run_analyze, run_server};
pub use server::{failure_summary, router, serve, ApiError, ApiResponse, AppState, StatusResponse};
