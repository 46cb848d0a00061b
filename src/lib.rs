//! # Clozegen
//!
//! Extracts testable, atomic medical facts from MKSAP question records and
//! rewrites them into flashcard-ready statements with identified cloze
//! candidates.
//!
//! The pipeline augments each question JSON in place with a
//! `true_statements` field (statements split by provenance), a per-question
//! `validation_pass` verdict, and a compact `nlp_analysis` summary. Source
//! questions are never destroyed: every unknown field round-trips unchanged.
//!
//! ## Stages
//!
//! 1. Medical NLP preprocessing (entities, negations, numeric tokens,
//!    atomicity) over the critique and key points
//! 2. LLM critique extraction and key-points extraction
//! 3. LLM cloze-candidate identification with deterministic post-processing
//! 4. Context enhancement (verbatim scan plus optional LLM enrichment)
//! 5. Text normalization and cross-stream consolidation
//! 6. Validator registry producing graded issues and the pass verdict
//!
//! ## Example
//!
//! ```rust,ignore
//! use clozegen::config::Config;
//! use clozegen::pipeline::Orchestrator;
//!
//! let config = Config::from_env()?;
//! let orchestrator = Orchestrator::new(&config)?;
//! let result = orchestrator.process("cvmcq24001")?;
//! assert!(result.success);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod checkpoint;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod extract;
pub mod llm;
pub mod models;
pub mod nlp;
pub mod observability;
pub mod pipeline;
pub mod prompts;
pub mod runner;
pub mod text;
pub mod validate;

// Re-exports for convenience
pub use config::Config;
pub use llm::LlmProvider;
pub use models::{
    ContextSource, NlpAnalysis, ProcessingResult, Provenance, QuestionRecord, Severity, Statement,
    TrueStatements, ValidationIssue,
};
pub use pipeline::Orchestrator;
pub use runner::{RunDriver, RunMode, RunOptions, RunSummary};

/// Error type for clozegen operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Config` | Missing env var, invalid path, unknown provider name |
/// | `Schema` | Malformed question JSON or missing required fields |
/// | `ProviderTransient` | Rate limit, timeout, 5xx, transient subprocess failure |
/// | `ProviderLimit` | Distinguished "usage limit reached" signal from a provider |
/// | `ProviderAuth` | Invalid or missing credentials |
/// | `Extraction` | LLM response lacks the expected top-level key |
/// | `OperationFailed` | Filesystem failures, non-retryable provider rejections |
/// | `Interrupted` | SIGINT/SIGTERM graceful stop |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Fatal configuration problem.
    ///
    /// Raised when:
    /// - A required environment variable is missing or unparseable
    /// - The configured provider name is not registered
    /// - The data root or artifacts directory cannot be created
    #[error("configuration error: {0}")]
    Config(String),

    /// Question JSON failed schema validation.
    ///
    /// Raised when:
    /// - The file is not valid JSON (`cause` carries the decoder offset)
    /// - A required field (`question_id`, `category`, `critique`,
    ///   `key_points`) is missing or of the wrong type
    #[error("schema error in '{path}': {cause}")]
    Schema {
        /// Path of the offending question file.
        path: String,
        /// Decoder message, including line/column where available.
        cause: String,
    },

    /// Retryable provider failure.
    ///
    /// Raised when:
    /// - The hosted API returns 429 or a 5xx status
    /// - A request times out
    /// - A local CLI exits non-zero with a transient-looking stderr
    #[error("provider '{provider}' transient failure: {cause}")]
    ProviderTransient {
        /// Provider short name.
        provider: String,
        /// The underlying cause.
        cause: String,
    },

    /// Provider signalled that its usage limit is reached.
    ///
    /// Terminates the run gracefully after an emergency checkpoint flush.
    #[error("provider '{provider}' usage limit reached")]
    ProviderLimit {
        /// Provider short name.
        provider: String,
    },

    /// Provider rejected the credentials.
    ///
    /// Fatal for the run; never retried per question.
    #[error("provider '{provider}' authentication failed: {cause}")]
    ProviderAuth {
        /// Provider short name.
        provider: String,
        /// The underlying cause.
        cause: String,
    },

    /// An LLM response did not match the expected extraction schema.
    ///
    /// Raised when:
    /// - The response lacks the stage's expected top-level key
    /// - The response is not parseable as JSON at all
    ///
    /// Carries the offending raw text (truncated) for the run log.
    #[error("extraction stage '{stage}' returned a malformed response: {cause}")]
    Extraction {
        /// The pipeline stage that failed.
        stage: String,
        /// Parse failure description.
        cause: String,
        /// The offending raw response, truncated for logging.
        response: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - A question file is missing or unreadable
    /// - An atomic write (tmp + fsync + rename) fails
    /// - A checkpoint save fails
    /// - A provider rejects a request for a non-retryable, non-auth reason
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The run was interrupted by SIGINT/SIGTERM.
    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Whether the retry loop in `llm::resilience` may retry this error.
    ///
    /// Only transient provider failures are retryable; everything else fails
    /// fast and surfaces to the orchestrator.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderTransient { .. })
    }

    /// Convenience constructor for [`Error::OperationFailed`].
    pub fn io(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for clozegen operations.
pub type Result<T> = std::result::Result<T, Error>;
