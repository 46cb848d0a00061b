//! Structure validators.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::Result;

/// `statement` must be non-empty; the candidate list must be present.
///
/// The declared field types are enforced by deserialization, so the
/// remaining runtime checks are emptiness and whitespace-only text.
pub fn required_fields(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if statement.statement.trim().is_empty() {
        issues.push(ValidationIssue::new(
            IssueCategory::Structure,
            Severity::Error,
            "statement text is empty",
            location,
        ));
    }
    if statement
        .extra_field
        .as_ref()
        .is_some_and(|extra| extra.trim().is_empty())
    {
        issues.push(
            ValidationIssue::new(
                IssueCategory::Structure,
                Severity::Warning,
                "extra_field is present but blank",
                location,
            )
            .with_suggestion("drop the field or fill it from the source"),
        );
    }
    Ok(issues)
}
