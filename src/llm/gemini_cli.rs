//! Gemini CLI wrapper (local, stateless per invocation).

use super::subprocess;
use super::LlmProvider;
use crate::Result;
use std::process::Command;

/// Wraps the `gemini` CLI: `gemini -p "<prompt>"`.
pub struct GeminiCliClient {
    binary: String,
    model: Option<String>,
}

impl GeminiCliClient {
    /// Default model identifier reported when `GEMINI_MODEL` is unset.
    pub const DEFAULT_MODEL: &'static str = "default";

    /// Creates a wrapper honoring `GEMINI_MODEL`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "gemini".to_string(),
            model: std::env::var("GEMINI_MODEL").ok(),
        }
    }

    /// Overrides the binary path (used by tests).
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the model passed via `-m`.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for GeminiCliClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for GeminiCliClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(Self::DEFAULT_MODEL)
    }

    fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.arg("-p").arg(prompt);
        if let Some(model) = &self.model {
            command.arg("-m").arg(model);
        }
        subprocess::run(command, None, "gemini")
    }
}
