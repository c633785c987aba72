//! Tracing subscriber setup.

use std::{env, fs};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "EVENTO_LOG";

/// Installs the global subscriber.
///
/// `EVENTO_LOG` takes precedence over the configured level. When a log file
/// is configured, the returned guard must be held until exit so buffered
/// lines are flushed.
///
/// # Errors
/// Returns an error for an invalid `EVENTO_LOG` directive or configured
/// level, an unusable log file location, or when a global subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let directive = env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(directive.as_deref(), config)?;

    let Some(file) = config.file.as_deref() else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;
        return Ok(None);
    };

    let (dir, file_name) = split_log_path(file)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(Some(guard))
}

/// Filter from the `EVENTO_LOG` value when set and non-blank, otherwise from
/// the configured level.
fn build_filter(directive: Option<&str>, config: &LoggingConfig) -> Result<EnvFilter> {
    if let Some(directive) = directive.map(str::trim).filter(|d| !d.is_empty()) {
        return EnvFilter::try_new(directive)
            .with_context(|| format!("Invalid {LOG_ENV_VAR} directive: {directive}"));
    }
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level in config: {}", config.level))
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, file_name))
}
