//! Retry with exponential backoff for provider calls.

use crate::Result;
use std::time::Duration;

/// Retry configuration for LLM calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum retry attempts after the first call.
    pub max_retries: u32,
    /// Initial backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the doubled backoff.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Builds retry configuration from the crate configuration.
    #[must_use]
    pub fn from_settings(settings: &crate::config::LlmSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            ..Self::default()
        }
    }

    /// Executes `call`, retrying classified-retryable failures with
    /// exponential backoff (doubling from `initial_backoff`, capped at
    /// `max_backoff`).
    ///
    /// Non-retryable errors fail fast on the first occurrence.
    pub fn execute<T, F>(&self, provider: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt <= self.max_retries => {
                    tracing::warn!(
                        provider,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying provider call: {err}"
                    );
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(self.max_backoff);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
