//! Claude CLI wrapper (local, stateless per invocation).

use super::subprocess;
use super::LlmProvider;
use crate::Result;
use std::process::Command;

/// Wraps the `claude` CLI: `claude -p "<prompt>" --output-format text`.
///
/// Sampling temperature is not exposed by the CLI; it still participates in
/// the response-cache fingerprint for key stability.
pub struct ClaudeCliClient {
    binary: String,
    model: Option<String>,
}

impl ClaudeCliClient {
    /// Default model identifier reported when `CLAUDE_MODEL` is unset.
    pub const DEFAULT_MODEL: &'static str = "default";

    /// Creates a wrapper honoring `CLAUDE_MODEL`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "claude".to_string(),
            model: std::env::var("CLAUDE_MODEL").ok(),
        }
    }

    /// Overrides the binary path (used by tests).
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the model passed via `--model`.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for ClaudeCliClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for ClaudeCliClient {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(Self::DEFAULT_MODEL)
    }

    fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.arg("-p").arg(prompt).arg("--output-format").arg("text");
        if let Some(model) = &self.model {
            command.arg("--model").arg(model);
        }
        subprocess::run(command, None, "claude")
    }
}
