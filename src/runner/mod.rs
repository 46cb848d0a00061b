//! Run driver.
//!
//! Iterates the selected question set through the orchestrator, honoring
//! resume/force/overwrite/dry-run options, records outcomes in the
//! provider checkpoint, reacts to cancellation and provider-limit signals,
//! and emits summary statistics.

use crate::checkpoint::CheckpointManager;
use crate::pipeline::{Orchestrator, ProcessOptions};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Which questions a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// One identifier.
    Single(String),
    /// Every identifier under a two-letter system code.
    System(String),
    /// The whole corpus.
    All,
    /// The whole corpus with skip-existing and resume, plus periodic stats.
    Production,
}

/// Run options, resolved from the CLI.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Question selection.
    pub mode: RunMode,
    /// Consult the checkpoint and skip already-processed questions.
    pub resume: bool,
    /// Re-process even when the checkpoint marks a question processed.
    pub force: bool,
    /// Augment even when `true_statements` is already present.
    pub overwrite: bool,
    /// No provider calls, no writes.
    pub dry_run: bool,
    /// Checkpoint batch size.
    pub batch_size: usize,
}

/// Per-system pass-rate accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryStats {
    /// Questions processed with a validation verdict.
    pub total: usize,
    /// Questions whose verdict was a pass.
    pub passed: usize,
}

/// End-of-run statistics.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Questions processed successfully this run.
    pub processed: usize,
    /// Questions that failed this run.
    pub failed: usize,
    /// Questions skipped via resume.
    pub skipped: usize,
    /// Total provider calls (cache hits excluded).
    pub total_api_calls: u64,
    /// Response-cache hits at run end.
    pub cache_hits: u64,
    /// Response-cache misses at run end.
    pub cache_misses: u64,
    /// Total wall time across processed and failed questions, milliseconds.
    pub total_wall_ms: u64,
    /// Validation pass rate per system code.
    pub per_category: BTreeMap<String, CategoryStats>,
    /// The run stopped on a provider usage limit.
    pub limit_reached: bool,
    /// The run was interrupted by a signal.
    pub interrupted: bool,
}

impl RunSummary {
    /// Average provider calls per attempted question.
    #[must_use]
    pub fn avg_api_calls(&self) -> f64 {
        let attempted = self.processed + self.failed;
        if attempted == 0 {
            0.0
        } else {
            self.total_api_calls as f64 / attempted as f64
        }
    }

    /// Average wall time per attempted question in milliseconds.
    #[must_use]
    pub fn avg_wall_ms(&self) -> f64 {
        let attempted = self.processed + self.failed;
        if attempted == 0 {
            0.0
        } else {
            self.total_wall_ms as f64 / attempted as f64
        }
    }

    /// Response-cache hit rate in `[0, 1]`.
    #[must_use]
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Process exit code: 3 when interrupted, 1 when anything failed or a
    /// usage limit stopped the run, 0 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.interrupted {
            3
        } else if self.limit_reached || self.failed > 0 {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run summary:")?;
        writeln!(f, "  processed:       {}", self.processed)?;
        writeln!(f, "  failed:          {}", self.failed)?;
        writeln!(f, "  skipped:         {}", self.skipped)?;
        writeln!(f, "  avg api calls:   {:.2}", self.avg_api_calls())?;
        writeln!(
            f,
            "  cache hit rate:  {:.1}% ({} hits / {} misses)",
            self.cache_hit_rate() * 100.0,
            self.cache_hits,
            self.cache_misses
        )?;
        writeln!(f, "  avg wall time:   {:.0} ms", self.avg_wall_ms())?;
        if !self.per_category.is_empty() {
            writeln!(f, "  validation pass rate by system:")?;
            for (system, stats) in &self.per_category {
                let rate = if stats.total == 0 {
                    0.0
                } else {
                    stats.passed as f64 / stats.total as f64 * 100.0
                };
                writeln!(
                    f,
                    "    {system}: {:.0}% ({}/{})",
                    rate, stats.passed, stats.total
                )?;
            }
        }
        if self.limit_reached {
            writeln!(f, "  stopped: provider usage limit reached")?;
        }
        if self.interrupted {
            writeln!(f, "  stopped: interrupted")?;
        }
        Ok(())
    }
}

/// Drives a run over the selected question set.
pub struct RunDriver {
    orchestrator: Orchestrator,
    checkpoint: CheckpointManager,
    options: RunOptions,
    cancel: Arc<AtomicBool>,
}

impl RunDriver {
    /// A driver with a fresh cancellation flag.
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        checkpoint: CheckpointManager,
        options: RunOptions,
    ) -> Self {
        Self {
            orchestrator,
            checkpoint,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The flag a signal handler sets to request a graceful stop.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs to completion, cancellation, usage limit, or fatal error.
    ///
    /// # Errors
    ///
    /// Only fatal errors (configuration, authentication) surface as `Err`;
    /// the checkpoint is flushed first.
    pub fn run(&mut self) -> Result<RunSummary> {
        let question_ids = self.select_questions()?;
        tracing::info!(
            count = question_ids.len(),
            mode = ?self.options.mode,
            dry_run = self.options.dry_run,
            "starting run"
        );

        let mut summary = RunSummary::default();
        let process_options = ProcessOptions {
            overwrite: self.options.overwrite,
            dry_run: self.options.dry_run,
        };

        for question_id in &question_ids {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::warn!("cancellation requested, stopping before '{question_id}'");
                summary.interrupted = true;
                break;
            }

            if self.options.resume
                && !self.options.force
                && self.checkpoint.is_processed(question_id)
            {
                summary.skipped += 1;
                continue;
            }

            let started = Instant::now();
            match self.orchestrator.process(question_id, process_options) {
                Ok(result) => {
                    summary.total_wall_ms += u64::try_from(started.elapsed().as_millis())
                        .unwrap_or(u64::MAX);
                    summary.total_api_calls += u64::from(result.api_calls);
                    if result.success {
                        summary.processed += 1;
                        if let Some(passed) = result.validation_pass {
                            let entry = summary
                                .per_category
                                .entry(crate::corpus::system_code(question_id).to_string())
                                .or_default();
                            entry.total += 1;
                            if passed {
                                entry.passed += 1;
                            }
                        }
                        if !self.options.dry_run {
                            self.checkpoint.mark_processed(question_id, true)?;
                        }
                    } else {
                        summary.failed += 1;
                        tracing::warn!(
                            question_id = %question_id,
                            "failed: {}",
                            result.error.as_deref().unwrap_or("unknown error")
                        );
                        if !self.options.dry_run {
                            self.checkpoint.mark_failed(question_id, true)?;
                        }
                    }
                    if self.options.mode == RunMode::Production
                        && (summary.processed + summary.failed) % self.options.batch_size.max(1) == 0
                    {
                        tracing::info!(
                            processed = summary.processed,
                            failed = summary.failed,
                            skipped = summary.skipped,
                            "progress"
                        );
                    }
                }
                Err(Error::ProviderLimit { provider }) => {
                    // Emergency flush, one distinguished log line, graceful stop.
                    self.checkpoint.flush()?;
                    tracing::error!(provider = %provider, "usage limit reached, stopping run");
                    summary.limit_reached = true;
                    break;
                }
                Err(err) => {
                    self.checkpoint.flush()?;
                    return Err(err);
                }
            }
        }

        if !self.options.dry_run {
            self.checkpoint.flush()?;
        }
        let stats = self.orchestrator.client().cache_stats();
        summary.cache_hits = stats.hits;
        summary.cache_misses = stats.misses;
        self.finish(&summary);
        Ok(summary)
    }

    /// Flushes the checkpoint outside the normal flow (signal handling).
    pub fn emergency_flush(&mut self) -> Result<()> {
        self.checkpoint.flush()
    }

    fn select_questions(&self) -> Result<Vec<String>> {
        let store = self.orchestrator.store();
        match &self.options.mode {
            RunMode::Single(question_id) => {
                if !crate::corpus::is_question_id(question_id) {
                    return Err(Error::Config(format!(
                        "'{question_id}' is not a valid question identifier"
                    )));
                }
                Ok(vec![question_id.clone()])
            }
            RunMode::System(system) => {
                if system.len() != 2 || !system.chars().all(|c| c.is_ascii_lowercase()) {
                    return Err(Error::Config(format!(
                        "'{system}' is not a two-letter system code"
                    )));
                }
                store.discover_system(system)
            }
            RunMode::All | RunMode::Production => store.discover(),
        }
    }

    fn finish(&self, summary: &RunSummary) {
        let stats = self.orchestrator.client().cache_stats();
        tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            api_calls = summary.total_api_calls,
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            "run finished"
        );
    }
}
