//! Provider-scoped checkpoint persistence.
//!
//! One file per provider under the checkpoints directory:
//! `<provider>_processed.json`, holding the processed and failed identifier
//! sets and a `last_updated` timestamp. Saves are atomic (tmp + fsync +
//! rename) and can be batched; an emergency flush runs on provider-limit
//! errors and on SIGINT/SIGTERM.
//!
//! One process per provider checkpoint is assumed; concurrent writers to
//! the same file are undefined behavior by contract.

use crate::corpus::write_atomic;
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default updates held in memory before a batched save.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// On-disk checkpoint payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CheckpointState {
    processed_questions: BTreeSet<String>,
    failed_questions: BTreeSet<String>,
    last_updated: Option<String>,
}

/// Summary counters for `stats` output.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointStats {
    /// Provider this checkpoint belongs to.
    pub provider: String,
    /// Questions processed successfully.
    pub processed: usize,
    /// Questions that failed.
    pub failed: usize,
    /// ISO-8601 timestamp of the last save, if any.
    pub last_updated: Option<String>,
}

/// Persistent set of processed and failed question identifiers.
pub struct CheckpointManager {
    path: PathBuf,
    provider: String,
    state: CheckpointState,
    batch_size: usize,
    pending: usize,
    dirty: bool,
}

impl CheckpointManager {
    /// Loads (or initializes) the checkpoint for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when an existing checkpoint file
    /// cannot be read or parsed.
    pub fn load(checkpoints_dir: &Path, provider: &str, batch_size: usize) -> Result<Self> {
        let path = checkpoints_dir.join(format!("{provider}_processed.json"));
        let state = if path.is_file() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::io("read_checkpoint", format!("{}: {e}", path.display())))?;
            serde_json::from_str(&content)
                .map_err(|e| Error::io("parse_checkpoint", format!("{}: {e}", path.display())))?
        } else {
            CheckpointState::default()
        };
        Ok(Self {
            path,
            provider: provider.to_string(),
            state,
            batch_size: batch_size.max(1),
            pending: 0,
            dirty: false,
        })
    }

    /// Whether `question_id` is marked processed.
    #[must_use]
    pub fn is_processed(&self, question_id: &str) -> bool {
        self.state.processed_questions.contains(question_id)
    }

    /// Whether `question_id` is marked failed.
    #[must_use]
    pub fn is_failed(&self, question_id: &str) -> bool {
        self.state.failed_questions.contains(question_id)
    }

    /// Marks a question processed, removing it from the failed set in the
    /// same save.
    ///
    /// With `batch` set, the change is held in memory until `batch_size`
    /// updates accumulate or [`flush`](Self::flush) runs.
    pub fn mark_processed(&mut self, question_id: &str, batch: bool) -> Result<()> {
        self.state
            .processed_questions
            .insert(question_id.to_string());
        self.state.failed_questions.remove(question_id);
        self.record_update(batch)
    }

    /// Marks a question failed. The latest outcome wins: a previously
    /// processed question that fails on a forced re-run moves to the failed
    /// set, keeping the two sets disjoint.
    pub fn mark_failed(&mut self, question_id: &str, batch: bool) -> Result<()> {
        self.state.processed_questions.remove(question_id);
        self.state.failed_questions.insert(question_id.to_string());
        self.record_update(batch)
    }

    fn record_update(&mut self, batch: bool) -> Result<()> {
        self.dirty = true;
        if batch {
            self.pending += 1;
            if self.pending >= self.batch_size {
                return self.flush();
            }
            return Ok(());
        }
        self.flush()
    }

    /// Saves pending changes now. No-op when nothing changed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io("create_checkpoints_dir", e))?;
        }
        self.state.last_updated = Some(Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::io("encode_checkpoint", e))?;
        write_atomic(&self.path, json.as_bytes())?;
        self.pending = 0;
        self.dirty = false;
        Ok(())
    }

    /// Clears both sets and deletes the checkpoint file.
    pub fn reset(&mut self) -> Result<()> {
        self.state = CheckpointState::default();
        self.pending = 0;
        self.dirty = false;
        if self.path.is_file() {
            std::fs::remove_file(&self.path)
                .map_err(|e| Error::io("remove_checkpoint", format!("{}: {e}", self.path.display())))?;
        }
        Ok(())
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CheckpointStats {
        CheckpointStats {
            provider: self.provider.clone(),
            processed: self.state.processed_questions.len(),
            failed: self.state.failed_questions.len(),
            last_updated: self.state.last_updated.clone(),
        }
    }
}
