//! Tracing setup: a quiet stderr layer plus a per-run log file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::current_timestamp;

/// Stderr filter for a given `-v` count; `RUST_LOG` overrides it
pub fn stderr_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Path of the log file for a run started now
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("{}.log", current_timestamp()))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits.
pub fn init_logging(log_dir: &Path, verbose: u8) -> Result<(WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let log_path = log_file_path(log_dir);
    let file_name = log_path
        .file_name()
        .context("Log file path has no file name")?
        .to_owned();

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(stderr_filter(verbose))),
        );

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok((guard, log_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(stderr_filter(0), "warn");
        assert_eq!(stderr_filter(1), "info");
        assert_eq!(stderr_filter(2), "debug");
        assert_eq!(stderr_filter(9), "trace");
    }

    #[test]
    fn test_log_file_lives_in_log_dir() {
        let path = log_file_path(Path::new("logs"));
        assert_eq!(path.parent(), Some(Path::new("logs")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("log"));
    }
}
