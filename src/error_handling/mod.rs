//! Error handling and lookup statistics.
//!
//! This module provides:
//! - Error type definitions for every layer (config, lookups, OCR, pipeline)
//! - Mapping of transport failures onto the lookup error taxonomy
//! - Retry strategy configuration
//! - Process-wide lookup outcome counters
//!
//! Lookup failures are categorized into:
//! - **NotFound**: the provider has no data for the domain (an expected outcome)
//! - **Unavailable**: transport failure, timeout or provider-side error
//! - **MalformedResponse**: the provider answered with something undecodable

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status, get_retry_strategy};
pub use stats::LookupStats;
pub use types::{
    ConfigError, EnrichmentError, FailureKind, InitializationError, LookupError, LookupOutcome,
    OcrError, PipelineError, QueryError,
};
