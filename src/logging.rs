#![forbid(unsafe_code)]

//! File logging for the CLI.
//!
//! Logs go to the configured file only, so command output on stdout stays
//! clean. Failing to open the log file never aborts a command.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use crate::error::LisaError;

/// Takes precedence over `logging.level` when set (`EnvFilter` syntax).
pub const LOG_ENV: &str = "LISA_LOG";

pub fn init(log_file: &Path, level: &str) -> anyhow::Result<()> {
    if let Some(parent) = log_file.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|source| LisaError::IoPath {
            path: log_file.to_path_buf(),
            source,
        })?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        file = %log_file.display(),
        "logging initialized"
    );
    Ok(())
}
