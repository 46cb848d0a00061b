//! Quality validators: atomicity, vagueness, patient-specific language,
//! meta references, and length.

use super::ValidationContext;
use crate::models::{IssueCategory, IssueLocation, Severity, Statement, ValidationIssue};
use crate::nlp::score_atomicity;
use crate::Result;

/// Vague quantifiers that weaken a flashcard unless a number qualifies them.
const VAGUE_WORDS: &[&str] = &[
    "often",
    "usually",
    "sometimes",
    "may",
    "might",
    "can",
    "could",
    "various",
    "several",
    "multiple",
    "frequently",
    "occasionally",
    "generally",
];

/// Phrases anchoring a statement to one patient.
const ANECDOTAL_PHRASES: &[&str] = &["this patient", "the patient's", "in this case"];

/// Residual patient-specific pronouns.
const PATIENT_PRONOUNS: &[&str] = &["he", "she", "his", "her", "him"];

/// Meta phrases referencing the source material.
const SOURCE_PHRASES: &[&str] = &[
    "this critique",
    "this question",
    "the vignette",
    "the critique",
    "the question stem",
    "the case presented",
];

/// Token-count bounds for a usable statement.
const MIN_TOKENS: usize = 4;
const MAX_TOKENS: usize = 40;

fn lowered_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .collect()
}

/// One clear testable fact; no more than one coordinating conjunction
/// joining independent clauses.
pub fn atomicity(
    statement: &Statement,
    location: IssueLocation,
    context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let entities = context
        .preprocessor
        .map(|preprocessor| preprocessor.find_entities(&statement.statement))
        .unwrap_or_default();
    let assessment = score_atomicity(&statement.statement, &entities);

    let mut issues = Vec::new();
    if assessment.independent_clauses >= 3 {
        issues.push(
            ValidationIssue::new(
                IssueCategory::Quality,
                Severity::Error,
                format!(
                    "statement joins {} independent clauses",
                    assessment.independent_clauses
                ),
                location,
            )
            .with_suggestion("split into one statement per fact"),
        );
    } else if assessment.independent_clauses == 2 {
        issues.push(
            ValidationIssue::new(
                IssueCategory::Quality,
                Severity::Warning,
                "statement joins two independent clauses",
                location,
            )
            .with_suggestion("consider splitting into two statements"),
        );
    }
    Ok(issues)
}

/// Flags vague quantifiers with no numeric qualifier in the statement.
pub fn vague_language(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let words = lowered_words(&statement.statement);
    let has_number = statement.statement.chars().any(|c| c.is_ascii_digit());
    let found: Vec<&str> = VAGUE_WORDS
        .iter()
        .filter(|vague| words.iter().any(|word| word == *vague))
        .copied()
        .collect();

    if found.is_empty() || has_number {
        return Ok(Vec::new());
    }
    Ok(vec![
        ValidationIssue::new(
            IssueCategory::Quality,
            Severity::Warning,
            format!("vague language without a qualifier: {}", found.join(", ")),
            location,
        )
        .with_suggestion("replace with the source's concrete frequency or condition"),
    ])
}

/// Flags patient-anecdotal phrasing that was not generalized.
pub fn board_relevance(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let lowered = statement.statement.to_lowercase();
    let found = ANECDOTAL_PHRASES
        .iter()
        .find(|phrase| lowered.contains(*phrase));
    Ok(found
        .map(|phrase| {
            vec![
                ValidationIssue::new(
                    IssueCategory::Quality,
                    Severity::Warning,
                    format!("patient-anecdotal phrasing: \"{phrase}\""),
                    location,
                )
                .with_suggestion("generalize to the relevant population"),
            ]
        })
        .unwrap_or_default())
}

/// Flags residual patient-specific pronouns.
pub fn patient_specific(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let words = lowered_words(&statement.statement);
    let found: Vec<&str> = PATIENT_PRONOUNS
        .iter()
        .filter(|pronoun| words.iter().any(|word| word == *pronoun))
        .copied()
        .collect();
    if found.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![
        ValidationIssue::new(
            IssueCategory::Quality,
            Severity::Error,
            format!("patient-specific pronoun(s): {}", found.join(", ")),
            location,
        )
        .with_suggestion("rewrite without reference to an individual patient"),
    ])
}

/// Flags meta phrases referencing the source question material.
pub fn source_references(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let lowered = statement.statement.to_lowercase();
    let found = SOURCE_PHRASES
        .iter()
        .find(|phrase| lowered.contains(*phrase));
    Ok(found
        .map(|phrase| {
            vec![
                ValidationIssue::new(
                    IssueCategory::Quality,
                    Severity::Error,
                    format!("statement references the source material: \"{phrase}\""),
                    location,
                )
                .with_suggestion("state the fact without referring to the question"),
            ]
        })
        .unwrap_or_default())
}

/// Flags statements outside the 4-40 token range.
pub fn statement_length(
    statement: &Statement,
    location: IssueLocation,
    _context: &ValidationContext<'_>,
) -> Result<Vec<ValidationIssue>> {
    let tokens = statement.statement.split_whitespace().count();
    if tokens < MIN_TOKENS {
        return Ok(vec![ValidationIssue::new(
            IssueCategory::Quality,
            Severity::Error,
            format!("statement has only {tokens} token(s)"),
            location,
        )]);
    }
    if tokens > MAX_TOKENS {
        return Ok(vec![
            ValidationIssue::new(
                IssueCategory::Quality,
                Severity::Warning,
                format!("statement has {tokens} tokens (limit {MAX_TOKENS})"),
                location,
            )
            .with_suggestion("split or tighten the sentence"),
        ]);
    }
    Ok(Vec::new())
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

    fn statement(text: &str) -> Statement {
        Statement::new(text.to_string(), Provenance::Critique)
    }

    #[test]
    fn test_vague_language_flagged() {
        let issues = vague_language(
            &statement("Statins may sometimes cause myalgia."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("may"));
        assert!(issues[0].message.contains("sometimes"));
    }

    #[test]
    fn test_vague_word_with_number_passes() {
        let issues = vague_language(
            &statement("Statins cause myalgia in several series, about 10% of patients."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert!(issues.is_empty());
    }

    #[test_case("This patient should receive aspirin."; "this patient")]
    #[test_case("The patient's creatinine doubled."; "the patients")]
    fn test_board_relevance_flagged(text: &str) {
        let issues =
            board_relevance(&statement(text), IssueLocation::Statement(0), &context()).unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_patient_pronoun_is_error() {
        let issues = patient_specific(
            &statement("She should start metformin for her diabetes."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_pronoun_substring_not_flagged() {
        // "Shear" contains "she"; word matching must not flag it.
        let issues = patient_specific(
            &statement("Shear stress injures the endothelium."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_source_reference_is_error() {
        let issues = source_references(
            &statement("As this critique explains, metformin is first-line."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_statement_length_bounds() {
        let short = statement_length(
            &statement("Too short."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].severity, Severity::Error);

        let long_text = "word ".repeat(45);
        let long = statement_length(&statement(&long_text), IssueLocation::Statement(0), &context())
            .unwrap();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].severity, Severity::Warning);

        let ok = statement_length(
            &statement("Metformin is first-line therapy for type 2 diabetes."),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert!(ok.is_empty());
    }

    #[test]
    fn test_atomicity_compound_statement() {
        let issues = atomicity(
            &statement(
                "Metformin is first-line therapy and insulin should be added when control fails \
                 and diet must be reviewed.",
            ),
            IssueLocation::Statement(0),
            &context(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }
}
