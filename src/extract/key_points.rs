//! Key-points extraction stage.

use super::guidance::format_nlp_guidance;
use super::parse_stage_response;
use crate::llm::LlmClient;
use crate::models::{Provenance, Statement};
use crate::nlp::NlpBundle;
use crate::prompts::PromptLibrary;
use crate::Result;
use serde::Deserialize;

/// Stage name, also the prompt template key.
pub const STAGE: &str = "key_points_extraction";

#[derive(Debug, Deserialize)]
struct RawStatement {
    statement: String,
    #[serde(default)]
    extra_field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    statements: Vec<RawStatement>,
}

/// Extracts 1-3 statements from the key-points list with minimal rewriting.
///
/// Empty input returns an empty list without a provider call.
pub fn extract(
    client: &LlmClient,
    prompts: &PromptLibrary,
    key_points: &[String],
    nlp: Option<&NlpBundle>,
    temperature: f32,
) -> Result<Vec<Statement>> {
    let points: Vec<&str> = key_points
        .iter()
        .map(|point| point.trim())
        .filter(|point| !point.is_empty())
        .collect();
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let listed: String = points
        .iter()
        .map(|point| format!("- {point}"))
        .collect::<Vec<_>>()
        .join("\n");
    let guidance = format_nlp_guidance(nlp);
    let prompt = prompts.render(
        STAGE,
        &[("key_points", listed.as_str()), ("nlp_guidance", &guidance)],
    )?;

    let response = client.generate(&prompt, temperature)?;
    let parsed: RawResponse = parse_stage_response(STAGE, "statements", &response)?;

    Ok(parsed
        .statements
        .into_iter()
        .filter(|raw| !raw.statement.trim().is_empty())
        .map(|raw| {
            let mut statement = Statement::new(raw.statement, Provenance::KeyPoints);
            statement.extra_field_verbatim = raw
                .extra_field
                .filter(|extra| !extra.trim().is_empty());
            statement
        })
        .collect())
}
