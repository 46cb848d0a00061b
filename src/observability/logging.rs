//! Structured logging via `tracing`.
//!
//! Each run logs human-readable lines to stderr and the full record to a
//! per-run file under `<artifacts>/logs/run-<timestamp>.log`. Level
//! filtering honors the `--log-level` flag, overridable with `RUST_LOG`.

use crate::{Error, Result};
use chrono::Utc;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. Returns the run-log path, or `None`
/// when the logs directory could not be created (stderr logging still
/// works).
pub fn init_logging(level: &str, logs_dir: &Path) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file = std::fs::create_dir_all(logs_dir).ok().and_then(|()| {
        let path = logs_dir.join(format!(
            "run-{}.log",
            Utc::now().format("%Y%m%d-%H%M%S")
        ));
        File::create(&path).ok().map(|file| (path, file))
    });

    match file {
        Some((path, file)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(path)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            tracing::warn!(
                "could not create log directory '{}'; logging to stderr only",
                logs_dir.display()
            );
            None
        }
    }
}

/// Outcome of a log-cleanup pass.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    /// Files removed (or that would be removed under dry-run).
    pub removed: Vec<PathBuf>,
    /// Files kept.
    pub kept: usize,
}

/// Deletes `run-*.log` files older than `keep_days`.
///
/// With `dry_run`, reports what would be removed without deleting.
pub fn clean_logs(logs_dir: &Path, keep_days: u64, dry_run: bool) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    if !logs_dir.is_dir() {
        return Ok(report);
    }
    let cutoff = SystemTime::now()
        .checked_sub(std::time::Duration::from_secs(keep_days * 24 * 3600));

    let entries = std::fs::read_dir(logs_dir)
        .map_err(|e| Error::io("read_logs_dir", format!("{}: {e}", logs_dir.display())))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with("run-") || !name.ends_with(".log") {
            continue;
        }
        let expired = match (cutoff, entry.metadata().and_then(|m| m.modified())) {
            (Some(cutoff), Ok(modified)) => modified < cutoff,
            _ => false,
        };
        if expired {
            if !dry_run {
                std::fs::remove_file(&path)
                    .map_err(|e| Error::io("remove_log", format!("{}: {e}", path.display())))?;
            }
            report.removed.push(path);
        } else {
            report.kept += 1;
        }
    }
    Ok(report)
}
