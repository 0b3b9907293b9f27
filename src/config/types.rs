//! Command-line types.
//!
//! This module defines the enums and structs used for command-line argument
//! parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_WEB_ROOT;
use crate::models::{Country, Granularity, QueryOverrides, YearMonth};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: One JSON object per line for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Screenshot domain analyzer.
///
/// # Examples
///
/// ```bash
/// # Serve the upload page and API
/// domain_analyzer serve --port 8080
///
/// # Analyze OCR text lines from a file
/// domain_analyzer analyze lines.txt --start-date 2023-01 --end-date 2023-06
///
/// # OCR a screenshot first
/// domain_analyzer analyze screenshot.png --image
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "domain_analyzer",
    version,
    about = "Extracts domain names from screenshot text and enriches them with archive and traffic history."
)]
pub struct Cli {
    /// JSON configuration file [default: config/config.json]
    #[arg(long, global = true, value_parser)]
    pub config: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (upload page, /upload, /status, /metrics)
    Serve(ServeArgs),
    /// Analyze text lines (or an image) once and print the JSON report
    Analyze(AnalyzeArgs),
}

/// Arguments of `serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen port, overriding `server.port` from the configuration
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding `template/index.html` and `static/`
    #[arg(long, default_value = DEFAULT_WEB_ROOT)]
    pub web_root: PathBuf,
}

/// Arguments of `analyze`.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input file; `-` or absent reads standard input
    #[arg(value_parser)]
    pub input: Option<PathBuf>,

    /// Treat the input as an image and run OCR on it first
    #[arg(long)]
    pub image: bool,

    /// Traffic query overrides
    #[command(flatten)]
    pub query: QueryArgs,
}

/// Traffic query overrides shared by the CLI and the upload form.
#[derive(Debug, Default, Args)]
pub struct QueryArgs {
    /// Series granularity: daily|weekly|monthly
    #[arg(long)]
    pub granularity: Option<Granularity>,

    /// First month of the series (YYYY-MM)
    #[arg(long)]
    pub start_date: Option<YearMonth>,

    /// Last month of the series (YYYY-MM)
    #[arg(long)]
    pub end_date: Option<YearMonth>,

    /// `world` or a two-letter country code
    #[arg(long)]
    pub country: Option<Country>,

    /// Exclude subdomains from the traffic series
    #[arg(long)]
    pub main_domain_only: bool,

    /// Include the current month to date
    #[arg(long)]
    pub mtd: bool,

    /// Only return verified traffic data
    #[arg(long)]
    pub show_verified: bool,
}

impl From<QueryArgs> for QueryOverrides {
    fn from(args: QueryArgs) -> Self {
        Self {
            granularity: args.granularity,
            start_date: args.start_date,
            end_date: args.end_date,
            country: args.country,
            main_domain_only: args.main_domain_only.then_some(true),
            month_to_date: args.mtd.then_some(true),
            show_verified: args.show_verified.then_some(true),
        }
    }
}
