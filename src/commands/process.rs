//! The `process` subcommand.

#![allow(clippy::print_stdout)]

use super::{Mode, ProcessArgs};
use crate::checkpoint::CheckpointManager;
use crate::config::Config;
use crate::pipeline::Orchestrator;
use crate::runner::{RunDriver, RunMode, RunOptions};
use crate::Result;

/// Runs the statement-generation pipeline per the parsed arguments.
pub fn cmd_process(args: &ProcessArgs, mut config: Config) -> Result<i32> {
    if let Some(provider) = &args.provider {
        config.provider = provider.trim().to_lowercase();
    }
    if let Some(temperature) = args.temperature {
        config.llm.temperature = temperature;
    }

    let mode = resolve_mode(args);
    let options = RunOptions {
        mode,
        resume: args.resume_enabled() || args.mode == Mode::Production,
        force: args.force,
        overwrite: args.overwrite,
        dry_run: args.dry_run,
        batch_size: args.batch_size.max(1),
    };

    let orchestrator = Orchestrator::new(&config)?;
    let checkpoint =
        CheckpointManager::load(&config.checkpoints_dir(), &config.provider, options.batch_size)?;
    let mut driver = RunDriver::new(orchestrator, checkpoint, options);

    // Graceful stop on SIGINT/SIGTERM: the driver finishes (or drops) the
    // current question, then flushes the checkpoint on its way out.
    let cancel = driver.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        cancel.store(true, std::sync::atomic::Ordering::SeqCst);
    }) {
        tracing::warn!("could not install signal handler: {e}");
    }

    let summary = driver.run()?;
    println!("{summary}");
    Ok(summary.exit_code())
}

fn resolve_mode(args: &ProcessArgs) -> RunMode {
    if args.mode == Mode::Production {
        return RunMode::Production;
    }
    if let Some(question_id) = &args.question_id {
        return RunMode::Single(question_id.clone());
    }
    if let Some(system) = &args.system {
        return RunMode::System(system.trim().to_lowercase());
    }
    RunMode::All
}
