//! Logger initialization.

use std::io::Write;

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

/// HTTP stack crates whose request-level chatter is capped at `info`.
const HTTP_STACK_MODULES: &[&str] = &["reqwest", "hyper_util", "tower_http"];

/// Installs the global logger.
///
/// `RUST_LOG` still applies, but `level` wins for this crate and for the
/// global default. Plain output is colored; JSON output is one object per line
/// with `ts`, `level`, `target` and `msg` keys.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(format == LogFormat::Plain);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for module in HTTP_STACK_MODULES {
        builder.filter_module(module, level.min(LevelFilter::Info));
    }

    match format {
        LogFormat::Json => builder.format(|buf, record| {
            let line = serde_json::json!({
                "ts": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "level": record.level().as_str(),
                "target": record.target(),
                "msg": record.args().to_string(),
            });
            writeln!(buf, "{line}")
        }),
        LogFormat::Plain => builder.format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {} {}",
                chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                level_tag(record.level()),
                record.target().cyan(),
                record.args()
            )
        }),
    };

    builder.try_init().map_err(InitializationError::from)
}

fn level_tag(level: Level) -> ColoredString {
    let tag = level.as_str();
    match level {
        Level::Error => tag.red().bold(),
        Level::Warn => tag.yellow(),
        Level::Info => tag.green(),
        Level::Debug => tag.blue(),
        Level::Trace => tag.purple(),
    }
}
