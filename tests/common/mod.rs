//! Shared fixtures for the integration suites.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use clozegen::config::CacheSettings;
use clozegen::llm::{LlmClient, LlmProvider, ResponseCache, RetryConfig};
use clozegen::{Error, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Per-stage scripted responses keyed by template markers.
pub struct StageResponses {
    pub critique: String,
    pub key_points: String,
    pub cloze: String,
    pub context: String,
}

impl Default for StageResponses {
    fn default() -> Self {
        Self {
            critique: r#"{"statements": []}"#.to_string(),
            key_points: r#"{"statements": []}"#.to_string(),
            cloze: r#"{"cloze_mapping": {}}"#.to_string(),
            context: r#"{"extra_field": null}"#.to_string(),
        }
    }
}

/// Scripted provider that routes on the stage markers baked into the
/// embedded prompt templates.
pub struct MockProvider {
    pub responses: StageResponses,
    /// Prompts containing this substring raise the provider-limit error.
    pub limit_trigger: Option<String>,
    pub critique_calls: AtomicU32,
    pub key_points_calls: AtomicU32,
    pub cloze_calls: AtomicU32,
    pub context_calls: AtomicU32,
}

impl MockProvider {
    pub fn new(responses: StageResponses) -> Self {
        Self {
            responses,
            limit_trigger: None,
            critique_calls: AtomicU32::new(0),
            key_points_calls: AtomicU32::new(0),
            cloze_calls: AtomicU32::new(0),
            context_calls: AtomicU32::new(0),
        }
    }

    pub fn with_limit_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.limit_trigger = Some(trigger.into());
        self
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-1"
    }

    fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        if let Some(trigger) = &self.limit_trigger {
            if prompt.contains(trigger.as_str()) {
                return Err(Error::ProviderLimit {
                    provider: "mock".to_string(),
                });
            }
        }
        if prompt.contains("extracting testable medical facts") {
            self.critique_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.critique.clone())
        } else if prompt.contains("converting MKSAP key points") {
            self.key_points_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.key_points.clone())
        } else if prompt.contains("selecting cloze") {
            self.cloze_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.cloze.clone())
        } else if prompt.contains("back of a medical flashcard") {
            self.context_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.context.clone())
        } else {
            Err(Error::io("mock_generate", "unrecognized stage prompt"))
        }
    }
}

/// Delegating wrapper so tests can keep a handle to the mock's counters
/// after the client takes ownership.
pub struct SharedProvider(pub std::sync::Arc<MockProvider>);

impl LlmProvider for SharedProvider {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn model(&self) -> &str {
        self.0.model()
    }

    fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.0.generate(prompt, temperature)
    }
}

/// A client with fast retries over the given provider.
pub fn client_over(provider: Box<dyn LlmProvider>) -> LlmClient {
    LlmClient::new(
        provider,
        ResponseCache::new(CacheSettings::default()),
        RetryConfig {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        },
    )
}

/// Seeds one question file under the corpus layout.
pub fn seed_question(
    root: &Path,
    question_id: &str,
    critique: &str,
    key_points: &[&str],
) {
    let system = &question_id[..2];
    let dir = root.join(system).join(question_id);
    fs::create_dir_all(&dir).unwrap();
    let body = serde_json::json!({
        "question_id": question_id,
        "category": system,
        "critique": critique,
        "key_points": key_points,
        "educational_objective": "Teach the tested point.",
        "options": {"A": "Option A", "B": "Option B"},
        "answer": "A"
    });
    fs::write(
        dir.join(format!("{question_id}.json")),
        serde_json::to_string_pretty(&body).unwrap(),
    )
    .unwrap();
}

/// Reads a seeded question back as a JSON value.
pub fn read_question_json(root: &Path, question_id: &str) -> serde_json::Value {
    let system = &question_id[..2];
    let path = root
        .join(system)
        .join(question_id)
        .join(format!("{question_id}.json"));
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
