//! Critique extraction stage.

use super::guidance::format_nlp_guidance;
use super::parse_stage_response;
use crate::llm::LlmClient;
use crate::models::{Provenance, Statement};
use crate::nlp::NlpBundle;
use crate::prompts::PromptLibrary;
use crate::Result;
use serde::Deserialize;

/// Stage name, also the prompt template key.
pub const STAGE: &str = "critique_extraction";

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

/// Extracts 3-7 atomic statements from the critique text.
///
/// The anti-hallucination constraints live in the prompt template; this
/// stage adds no post-hoc filtering beyond dropping empty statements.
pub fn extract(
    client: &LlmClient,
    prompts: &PromptLibrary,
    critique: &str,
    educational_objective: Option<&str>,
    nlp: Option<&NlpBundle>,
    temperature: f32,
) -> Result<Vec<Statement>> {
    let guidance = format_nlp_guidance(nlp);
    let prompt = prompts.render(
        STAGE,
        &[
            ("critique", critique),
            (
                "educational_objective",
                educational_objective.unwrap_or("(none provided)"),
            ),
            ("nlp_guidance", &guidance),
        ],
    )?;

    let response = client.generate(&prompt, temperature)?;
    let parsed: RawResponse = parse_stage_response(STAGE, "statements", &response)?;

    Ok(parsed
        .statements
        .into_iter()
        .filter(|raw| !raw.statement.trim().is_empty())
        .map(|raw| {
            let mut statement = Statement::new(raw.statement, Provenance::Critique);
            statement.extra_field_verbatim = raw
                .extra_field
                .filter(|extra| !extra.trim().is_empty());
            statement
        })
        .collect())
}
