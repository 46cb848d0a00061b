//! Command handlers module.
//!
//! Organizes the CLI command implementations:
//! - `process.rs`: the statement-generation run (single, system, all,
//!   production)
//! - `maintenance.rs`: stats, reset, clean-logs, clean-all
//! - `config.rs`: resolved-configuration display

mod config;
mod maintenance;
mod process;

pub use config::cmd_config;
pub use maintenance::{cmd_clean_all, cmd_clean_logs, cmd_reset, cmd_stats};
pub use process::cmd_process;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Extracts flashcard-ready medical statements from MKSAP question records.
#[derive(Parser)]
#[command(name = "clozegen", version, about, long_about = None)]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the statement-generation pipeline.
    Process(ProcessArgs),
    /// Print checkpoint and cache statistics; no writes.
    Stats,
    /// Clear the active provider's checkpoint.
    Reset,
    /// Delete old run logs.
    CleanLogs {
        /// Keep logs newer than this many days.
        #[arg(long, default_value_t = 7)]
        keep_days: u64,

        /// Show what would be removed without deleting.
        #[arg(long)]
        dry_run: bool,
    },
    /// Reset every provider checkpoint and delete all run logs.
    CleanAll,
    /// Print the resolved configuration.
    Config,
}

/// Run scale selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Process the selected questions once, interactively.
    Test,
    /// Batch mode over the corpus: skip existing, resume, periodic stats.
    Production,
}

/// Options for the `process` subcommand.
#[derive(Args)]
pub struct ProcessArgs {
    /// Process a single question by identifier.
    #[arg(long, conflicts_with = "system")]
    pub question_id: Option<String>,

    /// Process every question under a two-letter system code.
    #[arg(long)]
    pub system: Option<String>,

    /// Run mode.
    #[arg(long, value_enum, default_value = "test")]
    pub mode: Mode,

    /// Override the configured provider for this run.
    #[arg(long)]
    pub provider: Option<String>,

    /// Override the sampling temperature for this run.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Re-process questions already marked processed in the checkpoint.
    #[arg(long)]
    pub force: bool,

    /// Augment questions that already carry true_statements.
    #[arg(long)]
    pub overwrite: bool,

    /// Render prompts and run NLP, but no provider calls and no writes.
    #[arg(long)]
    pub dry_run: bool,

    /// Consult the checkpoint and skip processed questions (default).
    #[arg(long, overrides_with = "no_resume")]
    pub resume: bool,

    /// Ignore the checkpoint when selecting questions.
    #[arg(long)]
    pub no_resume: bool,

    /// Checkpoint save batch size.
    #[arg(long, default_value_t = crate::checkpoint::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl ProcessArgs {
    /// Whether resume is effective (on by default).
    #[must_use]
    pub const fn resume_enabled(&self) -> bool {
        !self.no_resume
    }
}

/// Dispatches a parsed CLI to its handler and returns the exit code.
///
/// # Errors
///
/// Fatal errors (configuration, authentication) bubble up for the binary
/// to map to exit code 2.
pub fn run(cli: Cli, config: crate::config::Config) -> crate::Result<i32> {
    match cli.command {
        Commands::Process(args) => cmd_process(&args, config),
        Commands::Stats => cmd_stats(&config),
        Commands::Reset => cmd_reset(&config),
        Commands::CleanLogs { keep_days, dry_run } => cmd_clean_logs(&config, keep_days, dry_run),
        Commands::CleanAll => cmd_clean_all(&config),
        Commands::Config => cmd_config(&config),
    }
}
