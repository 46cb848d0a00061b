//! Validator registry.
//!
//! An ordered set of independent validators producing graded issues. Each
//! validator is identified by `(category, name)`, can be disabled by
//! category, and receives the statement, its location, and a context
//! carrying the source text, the NLP bundle, sibling statements, and the
//! issues produced so far. Hallucination validators are registered last
//! because they may consume the other validators' output.
//!
//! A validator that fails internally is converted into a single
//! `error`-severity issue with category `validator_exception`; it never
//! aborts the batch.

mod ambiguity;
mod cloze;
mod context;
mod enumeration;
mod hallucination;
mod quality;
mod structure;

use crate::models::{
    IssueCategory, IssueLocation, Provenance, Severity, Statement, TrueStatements, ValidationIssue,
};
use crate::nlp::{NlpBundle, Preprocessor};
use crate::Result;
use std::collections::HashSet;

/// Everything a validator may consult besides the statement itself.
pub struct ValidationContext<'a> {
    /// The source text the statement's stream was extracted from.
    pub source_text: Option<&'a str>,
    /// NLP bundle for that source text, absent in legacy mode.
    pub nlp: Option<&'a NlpBundle>,
    /// Every statement of the question, both streams merged.
    pub siblings: &'a [Statement],
    /// The shared preprocessor, absent in legacy mode.
    pub preprocessor: Option<&'a Preprocessor>,
    /// Issues produced by earlier validators in the run.
    pub prior_issues: &'a [ValidationIssue],
}

/// A validator function.
///
/// Returns zero or more issues; an `Err` is converted by the registry into
/// a `validator_exception` issue at the statement's location.
pub type ValidatorFn =
    fn(&Statement, IssueLocation, &ValidationContext<'_>) -> Result<Vec<ValidationIssue>>;

/// A registered validator.
struct RegisteredValidator {
    category: IssueCategory,
    name: &'static str,
    run: ValidatorFn,
}

/// Per-question inputs shared by every validator invocation.
pub struct QuestionContext<'a> {
    /// The critique text.
    pub critique_text: &'a str,
    /// The key points joined into one text.
    pub key_points_text: &'a str,
    /// NLP bundle for the critique.
    pub critique_nlp: Option<&'a NlpBundle>,
    /// NLP bundle for the key points.
    pub key_points_nlp: Option<&'a NlpBundle>,
    /// The shared preprocessor.
    pub preprocessor: Option<&'a Preprocessor>,
}

/// Ordered, disableable validator registry.
pub struct ValidatorRegistry {
    validators: Vec<RegisteredValidator>,
    disabled: HashSet<IssueCategory>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ValidatorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: Vec::new(),
            disabled: HashSet::new(),
        }
    }

    /// The canonical registry, in its fixed run order.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(IssueCategory::Structure, "required_fields", structure::required_fields);
        registry.register(IssueCategory::Quality, "atomicity", quality::atomicity);
        registry.register(IssueCategory::Quality, "vague_language", quality::vague_language);
        registry.register(IssueCategory::Quality, "board_relevance", quality::board_relevance);
        registry.register(IssueCategory::Quality, "patient_specific", quality::patient_specific);
        registry.register(
            IssueCategory::Quality,
            "source_references",
            quality::source_references,
        );
        registry.register(
            IssueCategory::Quality,
            "statement_length",
            quality::statement_length,
        );
        registry.register(
            IssueCategory::Context,
            "extra_field_quality",
            context::extra_field_quality,
        );
        registry.register(IssueCategory::Cloze, "cloze_count", cloze::cloze_count);
        registry.register(
            IssueCategory::Cloze,
            "cloze_is_substring",
            cloze::cloze_is_substring,
        );
        registry.register(IssueCategory::Cloze, "cloze_triviality", cloze::cloze_triviality);
        registry.register(IssueCategory::Cloze, "cloze_generic", cloze::cloze_generic);
        registry.register(
            IssueCategory::Ambiguity,
            "medication_specificity",
            ambiguity::medication_specificity,
        );
        registry.register(IssueCategory::Ambiguity, "numeric_units", ambiguity::numeric_units);
        registry.register(
            IssueCategory::Enumeration,
            "list_handling",
            enumeration::list_handling,
        );
        // Hallucination validators must stay last.
        registry.register(
            IssueCategory::Hallucination,
            "source_fidelity",
            hallucination::source_fidelity,
        );
        registry.register(
            IssueCategory::Hallucination,
            "enhanced_context_grounding",
            hallucination::enhanced_context_grounding,
        );
        registry
    }

    /// Registers a validator at the end of the run order.
    pub fn register(&mut self, category: IssueCategory, name: &'static str, run: ValidatorFn) {
        self.validators.push(RegisteredValidator {
            category,
            name,
            run,
        });
    }

    /// Skips every validator in `category`.
    pub fn disable_category(&mut self, category: IssueCategory) {
        self.disabled.insert(category);
    }

    /// Number of enabled validators.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.validators
            .iter()
            .filter(|validator| !self.disabled.contains(&validator.category))
            .count()
    }

    /// Runs every enabled validator over every statement, in registration
    /// order, and returns the collected issues.
    #[must_use]
    pub fn run(&self, statements: &TrueStatements, question: &QuestionContext<'_>) -> Vec<ValidationIssue> {
        let merged: Vec<Statement> = statements.iter().cloned().collect();
        let mut issues: Vec<ValidationIssue> = Vec::new();

        for validator in &self.validators {
            if self.disabled.contains(&validator.category) {
                continue;
            }
            let mut produced: Vec<ValidationIssue> = Vec::new();
            for (index, statement) in merged.iter().enumerate() {
                let location = IssueLocation::Statement(index);
                let (source_text, nlp) = match statement.provenance {
                    Provenance::Critique => (question.critique_text, question.critique_nlp),
                    Provenance::KeyPoints => (question.key_points_text, question.key_points_nlp),
                };
                let context = ValidationContext {
                    source_text: Some(source_text),
                    nlp,
                    siblings: &merged,
                    preprocessor: question.preprocessor,
                    prior_issues: &issues,
                };
                match (validator.run)(statement, location, &context) {
                    Ok(found) => produced.extend(found),
                    Err(err) => {
                        tracing::warn!(
                            validator = validator.name,
                            category = %validator.category,
                            "validator failed: {err}"
                        );
                        produced.push(ValidationIssue::new(
                            IssueCategory::ValidatorException,
                            Severity::Error,
                            format!("validator '{}' failed: {err}", validator.name),
                            location,
                        ));
                    }
                }
            }
            issues.extend(produced);
        }
        issues
    }

    /// A question passes when no validator returned an `error` issue.
    #[must_use]
    pub fn verdict(issues: &[ValidationIssue]) -> bool {
        !issues.iter().any(|issue| issue.severity == Severity::Error)
    }
}
