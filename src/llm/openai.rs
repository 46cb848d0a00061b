//! Hosted chat-completions client.

use super::{LlmHttpConfig, LlmProvider, build_http_client};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hosted LLM client speaking the chat-completions wire form with Bearer
/// auth.
pub struct OpenAiClient {
    /// API key.
    api_key: Option<String>,
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Creates a client from `OPENAI_API_KEY` / `OPENAI_MODEL`.
    #[must_use]
    pub fn new() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());
        Self {
            api_key,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model,
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets HTTP client timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    fn request(&self, prompt: &str, temperature: f32) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| Error::ProviderAuth {
            provider: "openai".to_string(),
            cause: "OPENAI_API_KEY not set".to_string(),
        })?;

        let request = ChatRequest {
            model: self.model.clone(),
            temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::ProviderTransient {
                        provider: "openai".to_string(),
                        cause: e.to_string(),
                    }
                } else {
                    Error::io("openai_request", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let parsed: ChatResponse = response.json().map_err(|e| Error::io("openai_response", e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::io("openai_response", "no choices in response"))
    }
}

/// Maps an HTTP status and body to the error taxonomy.
fn classify_status(status: u16, body: &str) -> Error {
    let provider = "openai".to_string();
    match status {
        401 | 403 => Error::ProviderAuth {
            provider,
            cause: format!("API returned status {status}"),
        },
        429 if body.contains("insufficient_quota") => Error::ProviderLimit { provider },
        429 => Error::ProviderTransient {
            provider,
            cause: "rate limited (429)".to_string(),
        },
        500..=599 => Error::ProviderTransient {
            provider,
            cause: format!("API returned status {status}"),
        },
        _ => Error::io(
            "openai_request",
            format!("API returned status {status}: {}", super::truncate_for_log(body)),
        ),
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.request(prompt, temperature)
    }
}

/// Request to the chat-completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<Message>,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Response from the chat-completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}
