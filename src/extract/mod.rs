//! Prompt-stage extractors.
//!
//! Four stages, each one provider call (plus one additional call per
//! statement for context enhancement when gated in): critique extraction,
//! key-points extraction, cloze identification, and context enhancement.
//! Each stage renders its prompt template, invokes the LLM client, parses
//! the JSON response, and maps it to typed records.
//!
//! A response lacking the stage's expected top-level key raises
//! [`Error::Extraction`] carrying the offending raw text; the orchestrator
//! treats that as a question-level failure without aborting the run.

pub mod cloze;
pub mod context;
pub mod critique;
pub mod guidance;
pub mod key_points;

pub use guidance::format_nlp_guidance;

use crate::llm::{truncate_for_log, LlmClient};
use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// Parses a stage response, requiring `expected_key` at the top level.
///
/// # Errors
///
/// Returns [`Error::Extraction`] when the response is not JSON, lacks the
/// expected key, or does not match the stage's schema.
pub fn parse_stage_response<T: DeserializeOwned>(
    stage: &str,
    expected_key: &str,
    response: &str,
) -> Result<T> {
    let value = LlmClient::parse_json_response(stage, response)?;
    if value.get(expected_key).is_none() {
        return Err(Error::Extraction {
            stage: stage.to_string(),
            cause: format!("missing expected top-level key '{expected_key}'"),
            response: truncate_for_log(response),
        });
    }
    serde_json::from_value(value).map_err(|e| Error::Extraction {
        stage: stage.to_string(),
        cause: format!("response schema mismatch: {e}"),
        response: truncate_for_log(response),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        statements: Vec<String>,
    }

    #[test]
    fn test_parse_stage_response_success() {
        let parsed: Sample =
            parse_stage_response("critique_extraction", "statements", r#"{"statements": ["a"]}"#)
                .unwrap();
        assert_eq!(parsed.statements, ["a"]);
    }

    #[test]
    fn test_missing_key() {
        let result: Result<Sample> =
            parse_stage_response("critique_extraction", "statements", r#"{"other": []}"#);
        match result {
            Err(Error::Extraction { cause, .. }) => {
                assert!(cause.contains("statements"));
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[test]
    fn test_not_json() {
        let result: Result<Sample> =
            parse_stage_response("critique_extraction", "statements", "no json here");
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }
}
