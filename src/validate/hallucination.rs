//! Hallucination validators.
//!
//! These run last in the fixed order and verify statements against the
//! source text: key entities of the statement must be detectable in the
//! source, and every entity in enhanced context must be attributable to it.
//! Both require entity detection and are skipped in legacy mode.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::text::similarity_ratio;
use crate::Result;

/// Fuzzy-match threshold on entity surface forms.
const FUZZY_THRESHOLD: f32 = 0.8;

/// Key entities in the statement must be detectable in the source text.
pub fn source_fidelity(
    statement: &Statement,
    location: IssueLocation,
    context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let (Some(preprocessor), Some(source)) = (context.preprocessor, context.source_text) else {
        return Ok(Vec::new());
    };

    let mut issues = Vec::new();
    for entity in preprocessor.find_entities(&statement.statement) {
        if !appears_in(&entity.text, source) {
            issues.push(
                ValidationIssue::new(
                    IssueCategory::Hallucination,
                    Severity::Error,
                    format!("entity \"{}\" is not found in the source text", entity.text),
                    location,
                )
                .with_suggestion("remove or reword the unsupported entity"),
            );
        }
    }
    Ok(issues)
}

/// Every entity appearing in `extra_field_enhanced` must be attributable to
/// the source text.
pub fn enhanced_context_grounding(
    statement: &Statement,
    location: IssueLocation,
    context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let (Some(preprocessor), Some(source)) = (context.preprocessor, context.source_text) else {
        return Ok(Vec::new());
    };
    let Some(enhanced) = statement.extra_field_enhanced.as_deref() else {
        return Ok(Vec::new());
    };

    let mut issues = Vec::new();
    for entity in preprocessor.find_entities(enhanced) {
        if !appears_in(&entity.text, source) {
            issues.push(
                ValidationIssue::new(
                    IssueCategory::Hallucination,
                    Severity::Error,
                    format!(
                        "enhanced context mentions \"{}\", which the source does not",
                        entity.text
                    ),
                    location,
                )
                .with_suggestion("regenerate the enhanced context from the source only"),
            );
        }
    }
    Ok(issues)
}

/// Exact case-insensitive containment, falling back to a fuzzy word match
/// at [`FUZZY_THRESHOLD`] to tolerate inflection.
fn appears_in(entity: &str, source: &str) -> bool {
    let entity_lowered = entity.to_lowercase();
    let source_lowered = source.to_lowercase();
    if source_lowered.contains(&entity_lowered) {
        return true;
    }

    // Tolerate plural/inflected forms: every word of the entity must have a
    // close counterpart somewhere in the source.
    entity_lowered.split_whitespace().all(|entity_word| {
        source_lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|source_word| similarity_ratio(entity_word, source_word) >= FUZZY_THRESHOLD)
    })
}
