//! Binary entry point for clozegen.
//!
//! Parses the CLI, resolves configuration from the environment, initializes
//! logging, and maps errors to the documented exit codes: 0 success, 1 run
//! error, 2 fatal configuration error, 3 interrupted.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in the main binary for fatal-error reporting.
#![allow(clippy::print_stderr)]

use clap::Parser;
use clozegen::commands::{self, Cli};
use clozegen::config::Config;
use clozegen::observability::init_logging;
use clozegen::Error;

fn main() {
    // A .env file is honored when present; the process environment wins.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();
    init_logging(&cli.log_level, &config.logs_dir());

    let code = match commands::run(cli, config) {
        Ok(code) => code,
        Err(err @ (Error::Config(_) | Error::ProviderAuth { .. })) => {
            eprintln!("fatal: {err}");
            2
        }
        Err(Error::Interrupted) => {
            eprintln!("interrupted");
            3
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    };
    std::process::exit(code);
}
