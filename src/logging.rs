//! Log file setup.
//!
//! The terminal belongs to the UI, so all `tracing` output goes to
//! `<log_dir>/sketch.log` through a non-blocking writer. Keep the returned
//! guard alive until exit or buffered lines are lost.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

/// Environment variables consulted for a filter directive, in order.
const FILTER_ENV_VARS: [&str; 2] = ["SKETCH_LOG", "RUST_LOG"];

/// Log file name inside the log directory.
pub const LOG_FILE: &str = "sketch.log";

/// Pick the filter directive: environment first, then the configured level.
fn directive(configured: &str) -> String {
    FILTER_ENV_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

/// Install the global subscriber writing to `dir`.
pub fn init(dir: &Path, level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)?;

    let filter = EnvFilter::try_new(directive(level))
        .map_err(|err| AppError::Logging(format!("bad filter directive: {err}")))?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))?;

    Ok(guard)
}
