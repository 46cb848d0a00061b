//! Context enhancement stage (two-stage, hybrid).
//!
//! Stage A copies an explanatory passage from the originating source text
//! verbatim, with no provider call. Stage B asks the model to enrich the
//! context for statements whose verbatim passage is sparse or missing,
//! using only information present in the source. Stage B is gated by
//! configuration; when disabled, `context_source` is `verbatim` or `none`.

use super::parse_stage_response;
use crate::llm::LlmClient;
use crate::models::Statement;
use crate::prompts::PromptLibrary;
use crate::text::content_words;
use crate::Result;
use serde::Deserialize;

/// Stage name, also the prompt template key.
pub const STAGE: &str = "context_enhancement";

/// Verbatim passages shorter than this are considered sparse and eligible
/// for enhancement.
pub const MIN_VERBATIM_CHARS: usize = 60;

/// Minimum content-word overlap for a passage to count as explanatory.
const PASSAGE_OVERLAP_THRESHOLD: f32 = 0.5;

/// Longest passage copied verbatim, in characters.
const MAX_PASSAGE_CHARS: usize = 600;

#[derive(Debug, Deserialize)]
struct RawResponse {
    extra_field: Option<String>,
}

/// Applies both context stages to one statement stream.
///
/// `source_text` is the text the stream was extracted from (critique, or
/// the joined key points).
pub fn apply(
    client: &LlmClient,
    prompts: &PromptLibrary,
    statements: &mut [Statement],
    source_text: &str,
    enhancement_enabled: bool,
    temperature: f32,
) -> Result<()> {
    for statement in statements.iter_mut() {
        if statement.extra_field_verbatim.is_none() {
            statement.extra_field_verbatim = find_verbatim(&statement.statement, source_text);
        }

        if enhancement_enabled && needs_enhancement(statement) {
            statement.extra_field_enhanced =
                enhance(client, prompts, statement, source_text, temperature)?;
        }

        statement.resolve_context();
    }
    Ok(())
}

/// Enhancement gating policy: the verbatim passage is missing or sparse.
fn needs_enhancement(statement: &Statement) -> bool {
    statement
        .extra_field_verbatim
        .as_ref()
        .map_or(true, |verbatim| verbatim.chars().count() < MIN_VERBATIM_CHARS)
}

/// Stage A: scans the source for a passage explaining the statement.
///
/// Candidate passages are paragraphs (or adjacent-sentence windows when the
/// source is a single paragraph). The best passage wins when its
/// content-word overlap with the statement reaches the threshold and it adds
/// material beyond the statement itself.
fn find_verbatim(statement: &str, source_text: &str) -> Option<String> {
    let statement_words = content_words(statement);
    if statement_words.is_empty() {
        return None;
    }

    let candidates = candidate_passages(source_text);
    let mut best: Option<(f32, &str)> = None;
    for passage in &candidates {
        let passage_words = content_words(passage);
        if passage_words.is_empty() {
            continue;
        }
        let shared = statement_words.intersection(&passage_words).count();
        let overlap = shared as f32 / statement_words.len() as f32;
        // A passage that only restates the statement adds nothing.
        let adds_material = passage_words.difference(&statement_words).count() >= 3;
        if overlap >= PASSAGE_OVERLAP_THRESHOLD
            && adds_material
            && best.map_or(true, |(score, _)| overlap > score)
        {
            best = Some((overlap, passage.as_str()));
        }
    }

    best.map(|(_, passage)| {
        let mut passage = passage.trim().to_string();
        if passage.chars().count() > MAX_PASSAGE_CHARS {
            passage = passage.chars().take(MAX_PASSAGE_CHARS).collect();
        }
        passage
    })
}

fn candidate_passages(source_text: &str) -> Vec<String> {
    let paragraphs: Vec<&str> = source_text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect();
    if paragraphs.len() > 1 {
        return paragraphs.into_iter().map(str::to_string).collect();
    }

    // Single-paragraph source: use overlapping two-sentence windows so one
    // statement does not claim the whole critique as its context.
    let sentences = crate::nlp::segment(source_text);
    if sentences.len() < 2 {
        return sentences.into_iter().map(|span| span.text).collect();
    }
    sentences
        .windows(2)
        .map(|window| format!("{} {}", window[0].text, window[1].text))
        .collect()
}

/// Stage B: one provider call enriching the context from the source only.
fn enhance(
    client: &LlmClient,
    prompts: &PromptLibrary,
    statement: &Statement,
    source_text: &str,
    temperature: f32,
) -> Result<Option<String>> {
    let prompt = prompts.render(
        STAGE,
        &[
            ("statement", statement.statement.as_str()),
            ("source_text", source_text),
        ],
    )?;
    let response = client.generate(&prompt, temperature)?;
    let parsed: RawResponse = parse_stage_response(STAGE, "extra_field", &response)?;
    Ok(parsed
        .extra_field
        .map(|extra| extra.trim().to_string())
        .filter(|extra| !extra.is_empty() && extra != "null"))
}
