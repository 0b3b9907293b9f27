//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `domain_analyzer` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization and configuration loading
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use domain_analyzer::config::{Cli, Command, DEFAULT_CONFIG_PATH};
use domain_analyzer::initialization::init_logger_with;
use domain_analyzer::{failure_summary, run_analyze, run_server, ApiResponse, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets (Tencent Cloud keys, SimilarWeb API key) may live in a .env file,
    // either in the current directory or next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    init_logger_with(cli.log_level.into(), cli.log_format)
        .context("Failed to initialize logger")?;

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("domain_analyzer error: {:#}", e);
            process::exit(2);
        }
    };

    let outcome = match cli.command {
        Command::Serve(args) => run_server(config, args.port, args.web_root).await,
        Command::Analyze(args) => match run_analyze(config, args).await {
            Ok(analyses) => {
                let msg = failure_summary(&analyses);
                let report = ApiResponse::success(analyses, msg);
                serde_json::to_string_pretty(&report)
                    .map(|json| println!("{json}"))
                    .context("Failed to serialize report")
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = outcome {
        eprintln!("domain_analyzer error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

/// Loads the configuration file, then applies environment secrets.
///
/// A missing default file is not an error: the built-in defaults are used.
/// An explicitly requested file must exist.
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let mut config = if explicit.is_none() && !path.exists() {
        log::warn!(
            "No configuration file at {}; using built-in defaults",
            path.display()
        );
        AppConfig::default()
    } else {
        AppConfig::load(path)?
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
