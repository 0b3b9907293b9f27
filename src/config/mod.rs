//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, endpoints)
//! - The JSON configuration document and its loader
//! - CLI option types and parsing

mod constants;
mod settings;
mod types;

// Re-export all constants
pub use constants::*;
pub use settings::{
    AppConfig, EnrichmentConfig, ServerConfig, SimilarWebConfig, TencentCloudConfig,
    WebArchiveConfig, ENV_SIMILARWEB_API_KEY, ENV_TENCENT_SECRET_ID, ENV_TENCENT_SECRET_KEY,
};
pub use types::{AnalyzeArgs, Cli, Command, LogFormat, LogLevel, QueryArgs, ServeArgs};
