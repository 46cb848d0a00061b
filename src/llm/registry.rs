//! Name-keyed provider registry.
//!
//! Rust has no import-time side effects, so built-in providers are
//! registered explicitly by [`ProviderRegistry::with_builtins`], which the
//! run driver calls once at startup. Adding a provider requires only an
//! implementation of [`LlmProvider`] and one `register` call.

use super::{
    ClaudeCliClient, GeminiCliClient, LlmHttpConfig, LlmProvider, OllamaCliClient, OpenAiClient,
};
use crate::config::Config;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Factory producing a provider instance from configuration.
pub type ProviderFactory = Box<dyn Fn(&Config) -> Box<dyn LlmProvider> + Send + Sync>;

/// Registry of provider factories keyed by short name.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the four built-in providers registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("openai", |config| {
            Box::new(OpenAiClient::new().with_http_config(LlmHttpConfig::from_settings(&config.llm)))
        });
        registry.register("claude", |_| Box::new(ClaudeCliClient::new()));
        registry.register("gemini", |_| Box::new(GeminiCliClient::new()));
        registry.register("ollama", |_| Box::new(OllamaCliClient::new()));
        registry
    }

    /// Registers (or replaces) a provider factory under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Config) -> Box<dyn LlmProvider> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Builds the provider registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown name, listing the registered
    /// alternatives.
    pub fn build(&self, name: &str, config: &Config) -> Result<Box<dyn LlmProvider>> {
        self.factories.get(name).map_or_else(
            || {
                Err(Error::Config(format!(
                    "unknown provider '{name}'; registered providers: {}",
                    self.names().join(", ")
                )))
            },
            |factory| Ok(factory(config)),
        )
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
