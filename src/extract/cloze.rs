//! Cloze identification stage.

use super::parse_stage_response;
use crate::llm::LlmClient;
use crate::models::Statement;
use crate::prompts::PromptLibrary;
use crate::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Stage name, also the prompt template key.
pub const STAGE: &str = "cloze_identification";

/// Upper bound on candidates kept per statement.
const MAX_CANDIDATES: usize = 6;

#[derive(Debug, Deserialize)]
struct RawResponse {
    cloze_mapping: BTreeMap<String, Vec<String>>,
}

/// Identifies cloze candidates for every statement from both streams.
///
/// Statements are numbered 1..N, critique stream first. The response maps
/// each number to candidate spans; deterministic post-processing keeps only
/// exact contiguous substrings, deduplicates preserving first occurrence,
/// and caps the list at six. A statement left with zero candidates is not an
/// error here; the cloze-count validator raises on it.
pub fn identify(
    client: &LlmClient,
    prompts: &PromptLibrary,
    statements: &mut [&mut Statement],
    temperature: f32,
) -> Result<()> {
    if statements.is_empty() {
        return Ok(());
    }

    let numbered: String = statements
        .iter()
        .enumerate()
        .map(|(index, statement)| format!("{}. {}", index + 1, statement.statement))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = prompts.render(STAGE, &[("statements", numbered.as_str())])?;

    let response = client.generate(&prompt, temperature)?;
    let parsed: RawResponse = parse_stage_response(STAGE, "cloze_mapping", &response)?;

    for (key, spans) in parsed.cloze_mapping {
        let Ok(number) = key.parse::<usize>() else {
            tracing::debug!("ignoring non-numeric cloze mapping key '{key}'");
            continue;
        };
        let Some(statement) = number
            .checked_sub(1)
            .and_then(|index| statements.get_mut(index))
        else {
            tracing::debug!("ignoring out-of-range cloze mapping key '{key}'");
            continue;
        };
        statement.cloze_candidates = postprocess(&statement.statement, spans);
        if statement.cloze_candidates.is_empty() {
            tracing::debug!(
                "no usable cloze candidates for statement {number}: '{}'",
                statement.statement
            );
        }
    }

    Ok(())
}

/// Keeps exact contiguous substrings, deduplicated in first-occurrence
/// order, capped at [`MAX_CANDIDATES`].
fn postprocess(statement: &str, spans: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for span in spans {
        let span = span.trim().to_string();
        if span.is_empty() {
            continue;
        }
        if !statement.contains(&span) {
            tracing::debug!("dropping non-substring cloze candidate '{span}'");
            continue;
        }
        if kept.iter().any(|existing| existing == &span) {
            continue;
        }
        kept.push(span);
        if kept.len() == MAX_CANDIDATES {
            break;
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;
    use crate::llm::{LlmProvider, ResponseCache, RetryConfig};
    use crate::models::Provenance;

    struct FixedProvider(&'static str);

    impl LlmProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn model(&self) -> &str {
            "fixed-1"
        }
        fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn client(response: &'static str) -> LlmClient {
        LlmClient::new(
            Box::new(FixedProvider(response)),
            ResponseCache::new(CacheSettings::default()),
            RetryConfig::default(),
        )
    }

    #[test]
    fn test_candidates_assigned_by_index() {
        let mut first = Statement::new(
            "ACE inhibitors cause chronic cough.".to_string(),
            Provenance::Critique,
        );
        let mut second = Statement::new(
            "Blood pressure >140/90 mmHg defines hypertension.".to_string(),
            Provenance::KeyPoints,
        );
        let client = client(
            r#"{"cloze_mapping": {
                "1": ["ACE inhibitors", "chronic cough"],
                "2": [">140/90 mmHg", "hypertension"]
            }}"#,
        );
        let mut refs: Vec<&mut Statement> = vec![&mut first, &mut second];
        identify(&client, &PromptLibrary::default(), &mut refs, 0.0).unwrap();
        assert_eq!(first.cloze_candidates, ["ACE inhibitors", "chronic cough"]);
        assert_eq!(second.cloze_candidates, [">140/90 mmHg", "hypertension"]);
    }

    #[test]
    fn test_non_substring_dropped_and_deduplicated() {
        let mut statement = Statement::new(
            "Metformin is first-line therapy.".to_string(),
            Provenance::Critique,
        );
        let client = client(
            r#"{"cloze_mapping": {"1": ["Metformin", "insulin", "Metformin", "first-line"]}}"#,
        );
        let mut refs: Vec<&mut Statement> = vec![&mut statement];
        identify(&client, &PromptLibrary::default(), &mut refs, 0.0).unwrap();
        assert_eq!(statement.cloze_candidates, ["Metformin", "first-line"]);
    }

    #[test]
    fn test_out_of_range_keys_ignored() {
        let mut statement =
            Statement::new("Only one statement.".to_string(), Provenance::Critique);
        let client = client(r#"{"cloze_mapping": {"1": ["statement"], "9": ["ghost"], "x": ["y"]}}"#);
        let mut refs: Vec<&mut Statement> = vec![&mut statement];
        identify(&client, &PromptLibrary::default(), &mut refs, 0.0).unwrap();
        assert_eq!(statement.cloze_candidates, ["statement"]);
    }

    #[test]
    fn test_no_statements_skips_provider() {
        let client = client("unused");
        let mut refs: Vec<&mut Statement> = Vec::new();
        identify(&client, &PromptLibrary::default(), &mut refs, 0.0).unwrap();
        assert_eq!(client.api_calls(), 0);
    }
}
