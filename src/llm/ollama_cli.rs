//! Ollama CLI wrapper (local, stateless per invocation).

use super::subprocess;
use super::LlmProvider;
use crate::Result;
use std::process::Command;

/// Wraps the `ollama` CLI: `ollama run <model>` with the prompt on stdin.
pub struct OllamaCliClient {
    binary: String,
    model: String,
}

impl OllamaCliClient {
    /// Default model when `OLLAMA_MODEL` is unset.
    pub const DEFAULT_MODEL: &'static str = "llama3.1";

    /// Creates a wrapper honoring `OLLAMA_MODEL`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "ollama".to_string(),
            model: std::env::var("OLLAMA_MODEL")
                .unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string()),
        }
    }

    /// Overrides the binary path (used by tests).
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the model passed to `ollama run`.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for OllamaCliClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OllamaCliClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.arg("run").arg(&self.model);
        subprocess::run(command, Some(prompt), "ollama")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration() {
        let client = OllamaCliClient::new().with_model("qwen2.5");
        assert_eq!(client.name(), "ollama");
        assert_eq!(client.model(), "qwen2.5");
    }
}
