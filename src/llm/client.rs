//! Composed LLM client: cache, then retry, then provider dispatch.

use super::{
    LlmProvider, ProviderRegistry, ResponseCache, RetryConfig, extract_json_from_response,
    fingerprint, truncate_for_log,
};
use crate::config::Config;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};

/// The single entry point the extraction stages call.
///
/// Consults the response cache before dispatch; on a hit no provider call
/// occurs and `api_calls` is not incremented. Misses go through the retry
/// wrapper and are cached on success.
pub struct LlmClient {
    provider: Box<dyn LlmProvider>,
    cache: ResponseCache,
    retry: RetryConfig,
    api_calls: AtomicU32,
}

impl LlmClient {
    /// Composes a client over an explicit provider (used by tests).
    #[must_use]
    pub fn new(
        provider: Box<dyn LlmProvider>,
        cache: ResponseCache,
        retry: RetryConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            retry,
            api_calls: AtomicU32::new(0),
        }
    }

    /// Builds the configured provider from the built-in registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown provider name.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = ProviderRegistry::with_builtins().build(&config.provider, config)?;
        Ok(Self::new(
            provider,
            ResponseCache::new(config.cache),
            RetryConfig::from_settings(&config.llm),
        ))
    }

    /// The active provider's short name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// The active provider's model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Generates a completion, serving from the cache when possible.
    pub fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let key = fingerprint(prompt, self.provider.name(), self.provider.model(), temperature);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(provider = self.provider.name(), "response cache hit");
            return Ok(cached);
        }

        self.api_calls.fetch_add(1, Ordering::Relaxed);
        let response = self
            .retry
            .execute(self.provider.name(), || {
                self.provider.generate(prompt, temperature)
            })?;

        self.cache.put(key, response.clone());
        Ok(response)
    }

    /// Parses an expected-JSON response, stripping code fences and
    /// narration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] carrying the truncated raw text when
    /// the response is not valid JSON.
    pub fn parse_json_response(stage: &str, response: &str) -> Result<serde_json::Value> {
        let json = extract_json_from_response(response);
        serde_json::from_str(json).map_err(|e| Error::Extraction {
            stage: stage.to_string(),
            cause: format!("invalid JSON: {e}"),
            response: truncate_for_log(response),
        })
    }

    /// Total provider calls made through this client (cache hits excluded).
    #[must_use]
    pub fn api_calls(&self) -> u32 {
        self.api_calls.load(Ordering::Relaxed)
    }

    /// Snapshot of the response-cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> super::CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;
    use std::sync::Mutex;

    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn model(&self) -> &str {
            "scripted-1"
        }
        fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .remove(0)
        }
    }

    fn client(responses: Vec<Result<String>>) -> LlmClient {
        LlmClient::new(
            Box::new(ScriptedProvider::new(responses)),
            ResponseCache::new(CacheSettings::default()),
            RetryConfig {
                max_retries: 1,
                initial_backoff: std::time::Duration::from_millis(1),
                max_backoff: std::time::Duration::from_millis(2),
            },
        )
    }

    #[test]
    fn test_cache_prevents_second_dispatch() {
        let client = client(vec![Ok("answer".to_string())]);
        assert_eq!(client.generate("prompt", 0.0).unwrap(), "answer");
        // Second call must be served from cache; the scripted provider has
        // no responses left and would panic on dispatch.
        assert_eq!(client.generate("prompt", 0.0).unwrap(), "answer");
        assert_eq!(client.api_calls(), 1);
        assert_eq!(client.cache_stats().hits, 1);
    }

    #[test]
    fn test_retry_then_success_counts_one_call() {
        let client = client(vec![
            Err(Error::ProviderTransient {
                provider: "scripted".to_string(),
                cause: "flaky".to_string(),
            }),
            Ok("answer".to_string()),
        ]);
        assert_eq!(client.generate("prompt", 0.0).unwrap(), "answer");
        assert_eq!(client.api_calls(), 1);
    }

    #[test]
    fn test_parse_json_response() {
        let value =
            LlmClient::parse_json_response("critique_extraction", "```json\n{\"statements\":[]}\n```")
                .unwrap();
        assert!(value["statements"].is_array());

        let err = LlmClient::parse_json_response("critique_extraction", "I cannot help with that.");
        assert!(matches!(err, Err(Error::Extraction { .. })));
    }
}
