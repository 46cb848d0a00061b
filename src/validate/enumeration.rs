//! Enumeration validator.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::Result;

/// Minimum parallel items for a statement to count as an enumeration.
const MIN_LIST_ITEMS: usize = 3;

/// A statement enumerating three or more parallel items should be split or
/// use overlapping clozes, not one multi-term blank.
pub fn list_handling(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let items = serial_items(&statement.statement);
    if items < MIN_LIST_ITEMS {
        return Ok(Vec::new());
    }

    let multi_term_blank = statement
        .cloze_candidates
        .iter()
        .any(|candidate| candidate.contains(','));
    if multi_term_blank {
        return Ok(vec![
            ValidationIssue::new(
                IssueCategory::Enumeration,
                Severity::Warning,
                format!("{items}-item enumeration blanked as a single multi-term cloze"),
                location,
            )
            .with_suggestion("split the statement or use one overlapping cloze per item"),
        ]);
    }
    Ok(vec![
        ValidationIssue::new(
            IssueCategory::Enumeration,
            Severity::Info,
            format!("statement enumerates {items} parallel items"),
            location,
        )
        .with_suggestion("consider one statement per item"),
    ])
}

/// Counts items in a serial list ("A, B, and C" has three).
fn serial_items(text: &str) -> usize {
    let commas = text.matches(", ").count();
    if commas == 0 {
        return 1;
    }
    let has_conjunction = text.contains(" and ") || text.contains(" or ");
    if has_conjunction {
        commas + 2
    } else {
        commas + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn context() -> ValidationContext<'static> {
        ValidationContext {
            source_text: None,
            nlp: None,
            siblings: &[],
            preprocessor: None,
            prior_issues: &[],
        }
    }

    #[test]
    fn test_enumeration_with_multi_term_blank_warns() {
        let mut statement = Statement::new(
            "Causes of chronic cough include asthma, GERD, and upper airway cough syndrome."
                .to_string(),
            Provenance::Critique,
        );
        statement.cloze_candidates = vec!["asthma, GERD, and upper airway cough syndrome".to_string()];
        let issues = list_handling(&statement, IssueLocation::Statement(0), &context()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_enumeration_with_item_blanks_is_info() {
        let mut statement = Statement::new(
            "Causes of chronic cough include asthma, GERD, and upper airway cough syndrome."
                .to_string(),
            Provenance::Critique,
        );
        statement.cloze_candidates = vec!["asthma".to_string(), "GERD".to_string()];
        let issues = list_handling(&statement, IssueLocation::Statement(0), &context()).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_plain_statement_passes() {
        let statement = Statement::new(
            "Metformin is first-line therapy for type 2 diabetes.".to_string(),
            Provenance::Critique,
        );
        let issues = list_handling(&statement, IssueLocation::Statement(0), &context()).unwrap();
        assert!(issues.is_empty());
    }
}
