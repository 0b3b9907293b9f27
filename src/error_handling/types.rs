//! Error type definitions.
//!
//! This module defines the error types used throughout the application and the
//! outcome categories counted by [`super::LookupStats`].

use std::path::PathBuf;
use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::YearMonth;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// A provider is missing something it cannot work without.
    #[error("Provider setup error: {0}")]
    ProviderSetupError(String),
}

/// Errors raised while loading the JSON configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration document.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range (e.g. zero concurrency).
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The `traffic_query` section is inconsistent.
    #[error("Invalid default traffic query: {0}")]
    Query(#[from] QueryError),
}

/// Errors in traffic query parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A month that is not `YYYY-MM`.
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidYearMonth(String),

    /// A country that is neither `world` nor a two-letter code.
    #[error("invalid country '{0}', expected 'world' or a two-letter code")]
    InvalidCountry(String),

    /// An unknown granularity.
    #[error("invalid granularity '{0}', expected daily, weekly or monthly")]
    InvalidGranularity(String),

    /// `start` is later than `end`.
    #[error("start date {start} is after end date {end}")]
    InvalidRange {
        /// Requested first month
        start: YearMonth,
        /// Requested last month
        end: YearMonth,
    },

    /// A response format other than JSON.
    #[error("unsupported response format '{0}'")]
    UnsupportedFormat(String),
}

/// Why a lookup produced no usable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIterMacro)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider has no data for the domain
    NotFound,
    /// Transport failure, timeout or provider-side error
    Unavailable,
    /// The provider answered with something that could not be decoded
    MalformedResponse,
}

impl FailureKind {
    /// Stable lower-case name used in JSON and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::Unavailable => "unavailable",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

/// Error returned by the archive and traffic lookup ports.
///
/// Every variant is a per-domain, per-source outcome. None of them aborts
/// sibling lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The provider's index has no entry for the domain.
    #[error("no data found for {domain}")]
    NotFound {
        /// Host that was looked up
        domain: String,
    },

    /// Network error, timeout or provider-side failure.
    #[error("provider unavailable: {reason}")]
    Unavailable {
        /// Status code, transport error or provider message
        reason: String,
        /// Whether another attempt may succeed
        retriable: bool,
    },

    /// The provider payload could not be decoded.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl LookupError {
    /// A transient failure worth retrying.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        LookupError::Unavailable {
            reason: reason.into(),
            retriable: true,
        }
    }

    /// A provider refusal that will not change on retry (bad credentials, 4xx).
    pub fn rejected(reason: impl Into<String>) -> Self {
        LookupError::Unavailable {
            reason: reason.into(),
            retriable: false,
        }
    }

    /// The orchestrator gave up waiting for the lookup.
    pub fn timed_out(after: Duration) -> Self {
        LookupError::rejected(format!("timed out after {}ms", after.as_millis()))
    }

    /// Coarse category reported in a `LookupFailure`.
    pub fn kind(&self) -> FailureKind {
        match self {
            LookupError::NotFound { .. } => FailureKind::NotFound,
            LookupError::Unavailable { .. } => FailureKind::Unavailable,
            LookupError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            LookupError::Unavailable {
                retriable: true,
                ..
            }
        )
    }
}

/// Errors returned by the OCR collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// The upload had no bytes.
    #[error("empty image")]
    EmptyImage,

    /// The bytes are not an accepted image, or the service could not decode them.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The OCR service failed or rejected the request.
    #[error("ocr service error: {0}")]
    Service(String),
}

impl OcrError {
    /// True when the caller sent something unusable (maps to 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, OcrError::EmptyImage | OcrError::InvalidImage(_))
    }
}

/// Batch-level enrichment failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    /// The invocation was cancelled; completed results were discarded.
    #[error("enrichment cancelled after {completed} of {total} domains")]
    Cancelled {
        /// Domains whose lookups had finished
        completed: usize,
        /// Domains in the batch
        total: usize,
    },
}

/// Errors that make a whole pipeline invocation meaningless.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Text recognition failed.
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// The batch was cancelled.
    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    /// An image was submitted but no recognizer is configured.
    #[error("no OCR service configured")]
    OcrNotConfigured,
}

/// Outcome of a single lookup, as counted by [`super::LookupStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum LookupOutcome {
    /// A record was produced
    Success,
    /// See [`FailureKind::NotFound`]
    NotFound,
    /// See [`FailureKind::Unavailable`]
    Unavailable,
    /// See [`FailureKind::MalformedResponse`]
    MalformedResponse,
}

impl LookupOutcome {
    /// Metrics label for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::Success => "success",
            LookupOutcome::NotFound => "not_found",
            LookupOutcome::Unavailable => "unavailable",
            LookupOutcome::MalformedResponse => "malformed_response",
        }
    }
}

impl From<FailureKind> for LookupOutcome {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::NotFound => LookupOutcome::NotFound,
            FailureKind::Unavailable => LookupOutcome::Unavailable,
            FailureKind::MalformedResponse => LookupOutcome::MalformedResponse,
        }
    }
}

impl std::fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
