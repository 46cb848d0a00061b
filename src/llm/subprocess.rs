//! Shared subprocess plumbing for the local CLI providers.
//!
//! Each invocation is stateless: the wrapper spawns the CLI, feeds the
//! prompt (stdin or `-p` argument), and reads stdout as the model text.
//! Non-zero exits are classified by matching distinguished substrings in
//! stderr.

use crate::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// stderr substrings that signal the provider's usage limit was reached.
const LIMIT_MARKERS: &[&str] = &[
    "usage limit reached",
    "usage limit",
    "quota exceeded",
    "out of free quota",
    "resource_exhausted",
];

/// stderr substrings that signal an authentication problem.
const AUTH_MARKERS: &[&str] = &[
    "not logged in",
    "login required",
    "authentication",
    "unauthorized",
    "invalid api key",
];

/// Runs a prepared command, optionally writing `stdin_data` to its stdin,
/// and returns trimmed stdout.
///
/// # Errors
///
/// - [`Error::Config`] when the binary cannot be spawned at all
/// - [`Error::ProviderLimit`] / [`Error::ProviderAuth`] on distinguished
///   stderr markers
/// - [`Error::ProviderTransient`] for any other non-zero exit
pub fn run(mut command: Command, stdin_data: Option<&str>, provider: &'static str) -> Result<String> {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    let mut child = command.spawn().map_err(|e| {
        Error::Config(format!(
            "failed to spawn '{provider}' CLI: {e}; is it installed and on PATH?"
        ))
    })?;

    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(data.as_bytes())
                .map_err(|e| Error::ProviderTransient {
                    provider: provider.to_string(),
                    cause: format!("failed to write prompt to stdin: {e}"),
                })?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| Error::ProviderTransient {
            provider: provider.to_string(),
            cause: format!("failed to read CLI output: {e}"),
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(classify_stderr(provider, &stderr));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        return Err(Error::ProviderTransient {
            provider: provider.to_string(),
            cause: "CLI produced no output".to_string(),
        });
    }
    Ok(stdout)
}

/// Maps a non-zero CLI exit to the error taxonomy via stderr markers.
#[must_use]
pub fn classify_stderr(provider: &'static str, stderr: &str) -> Error {
    let lowered = stderr.to_lowercase();
    if LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Error::ProviderLimit {
            provider: provider.to_string(),
        };
    }
    if AUTH_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Error::ProviderAuth {
            provider: provider.to_string(),
            cause: super::truncate_for_log(stderr.trim()),
        };
    }
    Error::ProviderTransient {
        provider: provider.to_string(),
        cause: super::truncate_for_log(stderr.trim()),
    }
}
