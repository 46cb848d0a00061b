//! Context validators.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::text::similarity_ratio;
use crate::Result;

/// Minimum useful context length in characters.
const MIN_CONTEXT_CHARS: usize = 40;

/// Filler phrases that make a context field worthless.
const FILLER_PHRASES: &[&str] = &[
    "see source",
    "as stated above",
    "as mentioned",
    "refer to the text",
    "self-explanatory",
    "no additional context",
];

/// If present, `extra_field` must be long enough to explain something and
/// must not consist of filler or a restatement of the statement itself.
pub fn extra_field_quality(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let Some(extra) = statement.extra_field.as_deref() else {
        return Ok(Vec::new());
    };
    let extra = extra.trim();
    if extra.is_empty() {
        // structure::required_fields already reports blank fields.
        return Ok(Vec::new());
    }

    let mut issues = Vec::new();
    if extra.chars().count() < MIN_CONTEXT_CHARS {
        issues.push(
            ValidationIssue::new(
                IssueCategory::Context,
                Severity::Warning,
                format!(
                    "extra_field is only {} characters (minimum {MIN_CONTEXT_CHARS})",
                    extra.chars().count()
                ),
                location,
            )
            .with_suggestion("enhance from the source or drop the field"),
        );
    }

    let lowered = extra.to_lowercase();
    if FILLER_PHRASES.iter().any(|filler| lowered.contains(filler)) {
        issues.push(ValidationIssue::new(
            IssueCategory::Context,
            Severity::Warning,
            "extra_field consists of filler",
            location,
        ));
    }

    if similarity_ratio(extra, &statement.statement) >= 0.9 {
        issues.push(
            ValidationIssue::new(
                IssueCategory::Context,
                Severity::Warning,
                "extra_field merely restates the statement",
                location,
            )
            .with_suggestion("context should add mechanism or rationale"),
        );
    }
    Ok(issues)
}
