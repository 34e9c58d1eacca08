//! Process-wide log sink.
//!
//! The terminal belongs to the UI, so diagnostics go to an append-only file
//! `<dir>/anistream.log` through a non-blocking writer. `RUST_LOG` overrides
//! the default filter.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "anistream.log";
const DEFAULT_LOG_FILTER: &str = "anistream=info";

/// Path of the log file inside `dir`.
pub fn log_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE_NAME)
}

/// Install the file subscriber.
///
/// Fails if the directory cannot be created or the file cannot be opened.
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes pending lines.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let path = log_path(dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
        .try_init()
        .context("failed to install log subscriber")?;

    tracing::info!("Logging to {}", path.display());
    Ok(guard)
}
