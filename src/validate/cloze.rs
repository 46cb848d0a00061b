//! Cloze validators.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::Result;

/// Preferred upper bound on candidates per statement.
const PREFERRED_MAX: usize = 3;

/// Grammar words that make trivial blanks.
const GRAMMAR_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "for", "with", "is", "are", "was", "were",
    "to", "by", "at", "that", "this", "it", "as", "be",
];

/// Forbidden generic candidates.
const GENERIC_TERMS: &[&str] = &["diagnosis", "treatment", "patient", "condition"];

/// Error at zero candidates; warn above three.
pub fn cloze_count(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let count = statement.cloze_candidates.len();
    if count == 0 {
        return Ok(vec![
            ValidationIssue::new(
                IssueCategory::Cloze,
                Severity::Error,
                "no cloze candidates",
                location,
            )
            .with_suggestion("re-run cloze identification for this statement"),
        ]);
    }
    if count > PREFERRED_MAX {
        return Ok(vec![ValidationIssue::new(
            IssueCategory::Cloze,
            Severity::Warning,
            format!("{count} cloze candidates (preferred maximum {PREFERRED_MAX})"),
            location,
        )]);
    }
    Ok(Vec::new())
}

/// Every candidate must be an exact contiguous substring of the statement.
pub fn cloze_is_substring(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    Ok(statement
        .cloze_candidates
        .iter()
        .filter(|candidate| !statement.statement.contains(candidate.as_str()))
        .map(|candidate| {
            ValidationIssue::new(
                IssueCategory::Cloze,
                Severity::Error,
                format!("candidate \"{candidate}\" is not a substring of the statement"),
                location,
            )
        })
        .collect())
}

/// Candidates must not be grammar words or bare numbers without units.
///
/// Medical abbreviations and thresholds that carry a comparator or unit
/// pass.
pub fn cloze_triviality(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    for candidate in &statement.cloze_candidates {
        let lowered = candidate.trim().to_lowercase();
        if GRAMMAR_WORDS.contains(&lowered.as_str()) {
            issues.push(ValidationIssue::new(
                IssueCategory::Cloze,
                Severity::Error,
                format!("candidate \"{candidate}\" is a grammar word"),
                location,
            ));
            continue;
        }
        if is_bare_number(&lowered) {
            issues.push(
                ValidationIssue::new(
                    IssueCategory::Cloze,
                    Severity::Error,
                    format!("candidate \"{candidate}\" is a bare number without units"),
                    location,
                )
                .with_suggestion("include the comparator and/or unit in the blank"),
            );
        }
    }
    Ok(issues)
}

/// Forbids generic candidates that test nothing.
pub fn cloze_generic(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    Ok(statement
        .cloze_candidates
        .iter()
        .filter(|candidate| GENERIC_TERMS.contains(&candidate.trim().to_lowercase().as_str()))
        .map(|candidate| {
            ValidationIssue::new(
                IssueCategory::Cloze,
                Severity::Error,
                format!("candidate \"{candidate}\" is too generic to test"),
                location,
            )
        })
        .collect())
}

/// A number, decimal, or ratio with no comparator and no unit.
fn is_bare_number(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use test_case::test_case;

    fn context() -> ValidationContext<'static> {
        ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: None,
            prior_issues: &[],
        }
    }

    fn with_candidates(candidates: &[&str]) -> Statement {
        let mut statement = Statement::new(
            "Blood pressure >140/90 mmHg defines hypertension in the clinic.".to_string(),
            Provenance::Critique,
        );
        statement.cloze_candidates = candidates.iter().map(|c| (*c).to_string()).collect();
        statement
    }

    #[test]
    fn test_zero_candidates_is_error() {
        let issues = cloze_count(&with_candidates(&[]), IssueLocation::Statement(0), &context())
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_many_candidates_warns() {
        let issues = cloze_count(
            &with_candidates(&["hypertension", ">140/90 mmHg", "Blood pressure", "clinic"]),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_non_substring_is_error() {
        let issues = cloze_is_substring(
            &with_candidates(&["hypertension", "systolic pressure"]),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("systolic pressure"));
    }

    #[test_case("140"; "integer")]
    #[test_case("140/90"; "ratio")]
    #[test_case("1.5"; "decimal")]
    fn test_bare_number_is_error(candidate: &str) {
        let issues = cloze_triviality(
            &with_candidates(&[candidate]),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test_case(">140/90 mmHg"; "threshold with unit")]
    #[test_case("hypertension"; "medical term")]
    #[test_case("COPD"; "abbreviation")]
    fn test_meaningful_candidate_passes(candidate: &str) {
        let issues = cloze_triviality(
            &with_candidates(&[candidate]),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_grammar_word_is_error() {
        let issues = cloze_triviality(
            &with_candidates(&["the"]),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_generic_candidate_is_error() {
        let issues = cloze_generic(
            &with_candidates(&["treatment", "hypertension"]),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("treatment"));
    }
}
