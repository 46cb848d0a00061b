//! Shared NLP-guidance prompt block.
//!
//! Renders an NLP bundle into human-readable prompt text: an entity digest,
//! a negation block, a numeric-unit block, and an atomicity hint. Shared by
//! the critique, key-points, and context-enhancement stages so the wording
//! stays consistent. Purely advisory to the model; it does not change any
//! extraction schema.

use crate::nlp::NlpBundle;
use std::fmt::Write;

/// Entity digest cap, by salience.
const MAX_GUIDANCE_ENTITIES: usize = 15;

/// Formats the guidance block, or an empty string in legacy mode.
#[must_use]
pub fn format_nlp_guidance(bundle: Option<&NlpBundle>) -> String {
    let Some(bundle) = bundle else {
        return String::new();
    };
    if bundle.sentences.is_empty() {
        return String::new();
    }

    let mut block = String::from("\nMEDICAL NLP ANALYSIS (advisory):\n");

    let top = bundle.top_entities(MAX_GUIDANCE_ENTITIES);
    if !top.is_empty() {
        let digest: Vec<String> = top
            .iter()
            .map(|entity| format!("{} ({})", entity.text, entity.kind.as_str()))
            .collect();
        let _ = writeln!(block, "Detected entities: {}", digest.join(", "));
    }

    if !bundle.negations.is_empty() {
        block.push_str("\nCRITICAL - negations detected - preserve each exactly as written:\n");
        for negation in &bundle.negations {
            match &negation.entity {
                Some(entity) => {
                    let _ = writeln!(
                        block,
                        "  - \"{}\" negates \"{}\" (scope: \"{}\")",
                        negation.trigger, entity, negation.scope
                    );
                }
                None => {
                    let _ = writeln!(
                        block,
                        "  - \"{}\" (scope: \"{}\")",
                        negation.trigger, negation.scope
                    );
                }
            }
        }
    }

    if !bundle.numeric_tokens.is_empty() {
        let thresholds: Vec<&str> = bundle
            .numeric_tokens
            .iter()
            .map(|token| token.raw.as_str())
            .collect();
        let _ = writeln!(
            block,
            "\nNumeric values to keep verbatim: {}",
            thresholds.join(", ")
        );
    }

    if !bundle.fact_candidates.is_empty() {
        let numbers: Vec<String> = bundle
            .fact_candidates
            .iter()
            .map(|index| (index + 1).to_string())
            .collect();
        let _ = writeln!(
            block,
            "\nAtomicity: source sentence(s) {} are compound; split each into \
             single-fact statements.",
            numbers.join(", ")
        );
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{EntityKind, Lexicon, Preprocessor, SourceRole};

    fn bundle() -> NlpBundle {
        let preprocessor = Preprocessor::new(Lexicon::from_terms([
            ("hypertension", EntityKind::Condition),
            ("aspirin", EntityKind::Medication),
        ]));
        preprocessor.analyze(
            "Blood pressure >140/90 mmHg defines hypertension. \
             Aspirin is not recommended for primary prevention.",
            SourceRole::Critique,
        )
    }

    #[test]
    fn test_legacy_mode_is_empty() {
        assert_eq!(format_nlp_guidance(None), "");
    }

    #[test]
    fn test_guidance_sections() {
        let bundle = bundle();
        let guidance = format_nlp_guidance(Some(&bundle));
        assert!(guidance.contains("Detected entities"));
        assert!(guidance.contains("hypertension (condition)"));
        assert!(guidance.contains("CRITICAL"));
        assert!(guidance.contains("not recommended"));
        assert!(guidance.contains(">140/90 mmHg"));
    }
}
