//! Per-question processing outcome.

use serde::{Deserialize, Serialize};

/// Outcome of running the pipeline over one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// The processed question identifier.
    pub question_id: String,
    /// Whether the question was augmented (or cleanly skipped).
    pub success: bool,
    /// Number of statements written, across both streams.
    pub statements_extracted: usize,
    /// Error description when `success` is false.
    pub error: Option<String>,
    /// Provider calls made for this question (cache hits excluded).
    pub api_calls: u32,
    /// The question's validation verdict, when validators ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_pass: Option<bool>,
}

impl ProcessingResult {
    /// A successful result.
    #[must_use]
    pub fn succeeded(question_id: impl Into<String>, statements: usize, api_calls: u32) -> Self {
        Self {
            question_id: question_id.into(),
            success: true,
            statements_extracted: statements,
            error: None,
            api_calls,
            validation_pass: None,
        }
    }

    /// A failed result carrying the error description.
    #[must_use]
    pub fn failed(question_id: impl Into<String>, error: impl Into<String>, api_calls: u32) -> Self {
        Self {
            question_id: question_id.into(),
            success: false,
            statements_extracted: 0,
            error: Some(error.into()),
            api_calls,
            validation_pass: None,
        }
    }

    /// Attaches the validation verdict.
    #[must_use]
    pub const fn with_verdict(mut self, validation_pass: bool) -> Self {
        self.validation_pass = Some(validation_pass);
        self
    }
}
