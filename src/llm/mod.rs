//! LLM client abstraction.
//!
//! Presents one `generate(prompt) -> text` contract over four back-ends:
//! a hosted chat-completions API and three local CLI wrappers.
//!
//! # Supported Providers
//!
//! | Provider | Client | Environment Variables |
//! |----------|--------|----------------------|
//! | `openai` | [`OpenAiClient`] | `OPENAI_API_KEY`, `OPENAI_MODEL` |
//! | `claude` | [`ClaudeCliClient`] | `CLAUDE_MODEL` |
//! | `gemini` | [`GeminiCliClient`] | `GEMINI_MODEL` |
//! | `ollama` | [`OllamaCliClient`] | `OLLAMA_MODEL` |
//!
//! Providers register into a [`ProviderRegistry`] keyed by short name; the
//! run driver selects one via `LLM_PROVIDER`. The composed [`LlmClient`]
//! layers response caching and retry/backoff over the selected provider.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new module implementing [`LlmProvider`]
//! 2. Register a factory with [`ProviderRegistry::register`]

mod cache;
mod claude_cli;
mod client;
mod gemini_cli;
mod ollama_cli;
mod openai;
mod registry;
mod resilience;
mod subprocess;

pub use cache::{CacheStats, ResponseCache, fingerprint};
pub use claude_cli::ClaudeCliClient;
pub use client::LlmClient;
pub use gemini_cli::GeminiCliClient;
pub use ollama_cli::OllamaCliClient;
pub use openai::OpenAiClient;
pub use registry::ProviderRegistry;
pub use resilience::RetryConfig;

use crate::Result;
use std::time::Duration;

/// Trait for LLM providers.
pub trait LlmProvider: Send + Sync {
    /// The provider short name.
    fn name(&self) -> &'static str;

    /// The model identifier used for cache fingerprinting.
    fn model(&self) -> &str;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns a typed provider error: transient failures are retryable by
    /// the caller, authentication and usage-limit signals are not.
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// HTTP client configuration for hosted providers.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in seconds (0 to disable).
    pub timeout_secs: u64,
    /// Connect timeout in seconds (0 to disable).
    pub connect_timeout_secs: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl LlmHttpConfig {
    /// Builds HTTP configuration from the crate configuration.
    #[must_use]
    pub const fn from_settings(settings: &crate::config::LlmSettings) -> Self {
        Self {
            timeout_secs: settings.timeout_secs,
            connect_timeout_secs: 10,
        }
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout_secs));
    }
    if config.connect_timeout_secs > 0 {
        builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    }
    builder
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!("failed to build LLM HTTP client: {err}");
            reqwest::blocking::Client::new()
        })
}

/// Maximum response characters kept in error messages and logs.
const MAX_LOGGED_RESPONSE_CHARS: usize = 200;

/// Truncates a raw response for inclusion in errors and logs.
#[must_use]
pub fn truncate_for_log(response: &str) -> String {
    if response.chars().count() > MAX_LOGGED_RESPONSE_CHARS {
        let truncated: String = response.chars().take(MAX_LOGGED_RESPONSE_CHARS).collect();
        format!("{truncated}...(truncated)")
    } else {
        response.to_string()
    }
}

/// Extracts JSON from an LLM response, handling markdown code fences and
/// surrounding narration.
///
/// # Handling
///
/// 1. Markdown code blocks with a `json` language marker
/// 2. Markdown code blocks without a language marker
/// 3. Raw JSON objects (first `{` to last `}`)
/// 4. JSON arrays (first `[` to last `]`)
///
/// Returns the trimmed input when no JSON-looking span is found.
#[must_use]
pub fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some((json_start, end)) = trimmed.find("```json").and_then(|start| {
        let json_start = start + 7;
        trimmed[json_start..]
            .find("```")
            .map(|end| (json_start, end))
    }) {
        return trimmed[json_start..json_start + end].trim();
    }

    // Handle ``` ... ``` blocks (without json marker)
    if let Some((json_start, end)) = trimmed.find("```").and_then(|start| {
        let content_start = start + 3;
        let after_marker = &trimmed[content_start..];
        let json_start = after_marker
            .find('{')
            .map_or(content_start, |pos| content_start + pos);
        trimmed[json_start..]
            .find("```")
            .map(|end| (json_start, end))
    }) {
        return trimmed[json_start..json_start + end].trim();
    }

    // Handle raw JSON (find first { to last })
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    // Handle JSON arrays
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}
