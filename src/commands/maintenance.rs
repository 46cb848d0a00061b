//! Maintenance subcommands: stats, reset, clean-logs, clean-all.

#![allow(clippy::print_stdout)]

use crate::checkpoint::CheckpointManager;
use crate::config::Config;
use crate::observability::clean_logs;
use crate::{Error, Result};

/// Prints checkpoint and cache statistics. No writes.
pub fn cmd_stats(config: &Config) -> Result<i32> {
    let checkpoint = CheckpointManager::load(&config.checkpoints_dir(), &config.provider, 1)?;
    let stats = checkpoint.stats();
    println!("Checkpoint ({}):", stats.provider);
    println!("  processed: {}", stats.processed);
    println!("  failed:    {}", stats.failed);
    println!(
        "  updated:   {}",
        stats.last_updated.as_deref().unwrap_or("never")
    );
    println!("Response cache:");
    println!("  enabled:     {}", config.cache.enabled);
    println!("  ttl:         {} s", config.cache.ttl_secs);
    println!("  max entries: {}", config.cache.max_entries);
    Ok(0)
}

/// Clears the active provider's checkpoint.
pub fn cmd_reset(config: &Config) -> Result<i32> {
    let mut checkpoint = CheckpointManager::load(&config.checkpoints_dir(), &config.provider, 1)?;
    checkpoint.reset()?;
    println!("Checkpoint for '{}' cleared.", config.provider);
    Ok(0)
}

/// Deletes run logs older than `keep_days`.
pub fn cmd_clean_logs(config: &Config, keep_days: u64, dry_run: bool) -> Result<i32> {
    let report = clean_logs(&config.logs_dir(), keep_days, dry_run)?;
    let verb = if dry_run { "Would remove" } else { "Removed" };
    println!("{verb} {} log file(s), kept {}.", report.removed.len(), report.kept);
    for path in &report.removed {
        println!("  {}", path.display());
    }
    Ok(0)
}

/// Resets every provider checkpoint and removes all run logs.
pub fn cmd_clean_all(config: &Config) -> Result<i32> {
    let checkpoints_dir = config.checkpoints_dir();
    let mut removed = 0;
    if checkpoints_dir.is_dir() {
        let entries = std::fs::read_dir(&checkpoints_dir).map_err(|e| {
            Error::io(
                "read_checkpoints_dir",
                format!("{}: {e}", checkpoints_dir.display()),
            )
        })?;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with("_processed.json") {
                std::fs::remove_file(entry.path())
                    .map_err(|e| Error::io("remove_checkpoint", e))?;
                removed += 1;
            }
        }
    }
    let logs = clean_logs(&config.logs_dir(), 0, false)?;
    println!(
        "Removed {removed} checkpoint(s) and {} log file(s).",
        logs.removed.len()
    );
    Ok(0)
}
