//! Ambiguity validators: medication specificity and numeric units.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::nlp::EntityKind;
use crate::Result;

/// Suffixes and words that indicate a drug class or mechanism.
const CLASS_MARKERS: &[&str] = &[
    "inhibitor",
    "inhibitors",
    "blocker",
    "blockers",
    "agonist",
    "agonists",
    "antagonist",
    "antagonists",
    "diuretic",
    "diuretics",
    "statin",
    "statins",
    "antibiotic",
    "antibiotics",
    "anticoagulant",
    "anticoagulants",
    "antidepressant",
    "antidepressants",
    "class",
    "mechanism",
];

/// A statement naming a specific medication should carry its class or
/// mechanism so the card is answerable without the question stem.
///
/// Requires entity detection; skipped in legacy mode.
pub fn medication_specificity(
    statement: &Statement,
    location: IssueLocation,
    context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let Some(preprocessor) = context.preprocessor else {
        return Ok(Vec::new());
    };
    let entities = preprocessor.find_entities(&statement.statement);
    let medication = entities
        .iter()
        .find(|entity| entity.kind == EntityKind::Medication);
    let Some(medication) = medication else {
        return Ok(Vec::new());
    };

    let lowered = statement.statement.to_lowercase();
    let has_class = CLASS_MARKERS.iter().any(|marker| {
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *marker)
    });
    // The medication surface itself may be a class term ("ACE inhibitor").
    let medication_is_class = CLASS_MARKERS
        .iter()
        .any(|marker| medication.text.to_lowercase().contains(marker));

    if has_class || medication_is_class {
        return Ok(Vec::new());
    }
    Ok(vec![
        ValidationIssue::new(
            IssueCategory::Ambiguity,
            Severity::Warning,
            format!(
                "medication \"{}\" appears without its class or mechanism",
                medication.text
            ),
            location,
        )
        .with_suggestion("name the drug class or mechanism in the statement"),
    ])
}

/// Numeric cloze candidates must carry a comparator and/or unit.
pub fn numeric_units(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    for candidate in &statement.cloze_candidates {
        if !candidate.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        let has_comparator = candidate.chars().any(|c| matches!(c, '<' | '>' | '≤' | '≥' | '='));
        let has_unit = candidate
            .chars()
            .any(|c| c.is_alphabetic() || c == '%' || c == 'µ');
        if !has_comparator && !has_unit {
            issues.push(
                ValidationIssue::new(
                    IssueCategory::Ambiguity,
                    Severity::Error,
                    format!("numeric candidate \"{candidate}\" lacks a comparator and unit"),
                    location,
                )
                .with_suggestion("extend the blank to include the comparator and/or unit"),
            );
        }
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use crate::nlp::{Lexicon, Preprocessor};

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(Lexicon::from_terms([
            ("lisinopril", EntityKind::Medication),
            ("ace inhibitor", EntityKind::Medication),
            ("hypertension", EntityKind::Condition),
        ]))
    }

    fn statement_with(text: &str, candidates: &[&str]) -> Statement {
        let mut statement = Statement::new(text.to_string(), Provenance::Critique);
        statement.cloze_candidates = candidates.iter().map(|c| (*c).to_string()).collect();
        statement
    }

    #[test]
    fn test_medication_without_class_warns() {
        let preprocessor = preprocessor();
        let context = ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: Some(&preprocessor),
            prior_issues: &[],
        };
        let issues = medication_specificity(
            &statement_with("Lisinopril is preferred for hypertension.", &[]),
            IssueLocation::Statement(0),
            &context,
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Lisinopril"));
    }

    #[test]
    fn test_medication_with_class_passes() {
        let preprocessor = preprocessor();
        let context = ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: Some(&preprocessor),
            prior_issues: &[],
        };
        let issues = medication_specificity(
            &statement_with(
                "Lisinopril, an ACE inhibitor, is preferred for hypertension.",
                &[],
            ),
            IssueLocation::Statement(0),
            &context,
        )
        .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_legacy_mode_skips_medication_check() {
        let context = ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: None,
            prior_issues: &[],
        };
        let issues = medication_specificity(
            &statement_with("Lisinopril is preferred.", &[]),
            IssueLocation::Statement(0),
            &context,
        )
        .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_bare_numeric_cloze_is_error() {
        let context = ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: None,
            prior_issues: &[],
        };
        let issues = numeric_units(
            &statement_with("Blood pressure >140/90 mmHg defines hypertension.", &["140"]),
            IssueLocation::Statement(0),
            &context,
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_threshold_cloze_passes() {
        let context = ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: None,
            prior_issues: &[],
        };
        let issues = numeric_units(
            &statement_with(
                "Blood pressure >140/90 mmHg defines hypertension.",
                &[">140/90 mmHg", "hypertension"],
            ),
            IssueLocation::Statement(0),
            &context,
        )
        .unwrap();
        assert!(issues.is_empty());
    }
}
