//! `tracing` subscriber setup.
//!
//! Logs go to stdout, and additionally to `logging.file` (default
//! `print_agent.log`) unless it is set to an empty string.
//! `RUST_LOG` takes precedence over the configured level.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::infrastructure::config::LoggingConfig;

/// Fallback when neither `RUST_LOG` nor the config gives a usable filter.
const FALLBACK_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not install log subscriber: {0}")]
    Init(String),
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::File`] if the log file cannot be opened for
/// appending and [`LoggingError::Init`] if a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directive(&config.level, rust_log.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL));

    let file_layer = match config.file_path() {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

/// Picks the filter directive: a non-empty `RUST_LOG` wins over `level`.
fn filter_directive<'a>(level: &'a str, rust_log: Option<&'a str>) -> &'a str {
    match rust_log.map(str::trim) {
        Some(env) if !env.is_empty() => env,
        _ if !level.trim().is_empty() => level.trim(),
        _ => FALLBACK_LEVEL,
    }
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
