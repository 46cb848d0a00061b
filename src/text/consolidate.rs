//! Near-duplicate detection and merging across the two extraction streams.
//!
//! Two statements are duplicates when their character-level similarity is at
//! least [`SIMILARITY_THRESHOLD`] and their medical-entity overlap is at
//! least [`ENTITY_OVERLAP_THRESHOLD`]. The pairwise pass is O(n²) over
//! per-question statement counts, which stay below twenty.

use super::content_words;
use crate::models::{Provenance, Statement, TrueStatements};
use crate::nlp::Preprocessor;

/// Character-similarity threshold for duplicate detection.
pub const SIMILARITY_THRESHOLD: f32 = 0.80;

/// Entity-overlap threshold for duplicate detection.
pub const ENTITY_OVERLAP_THRESHOLD: f32 = 0.5;

/// Normalized character-level similarity: longest common subsequence length
/// over the longer input, case-insensitive.
#[must_use]
pub fn similarity_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Two-row LCS; statements are short so quadratic time is fine.
    let mut previous = vec![0_usize; b.len() + 1];
    let mut current = vec![0_usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
        current.fill(0);
    }
    let lcs = previous[b.len()];
    lcs as f32 / a.len().max(b.len()) as f32
}

/// Medical-entity overlap between two statements: shared entities over the
/// smaller entity set. Falls back to content-word overlap in legacy mode.
#[must_use]
pub fn entity_overlap(a: &str, b: &str, preprocessor: Option<&Preprocessor>) -> f32 {
    if let Some(preprocessor) = preprocessor {
        let entities_a: Vec<String> = preprocessor
            .find_entities(a)
            .into_iter()
            .map(|e| e.text.to_lowercase())
            .collect();
        let entities_b: Vec<String> = preprocessor
            .find_entities(b)
            .into_iter()
            .map(|e| e.text.to_lowercase())
            .collect();
        if !entities_a.is_empty() && !entities_b.is_empty() {
            let shared = entities_a
                .iter()
                .filter(|entity| entities_b.contains(entity))
                .count();
            return shared as f32 / entities_a.len().min(entities_b.len()) as f32;
        }
    }

    let words_a = content_words(a);
    let words_b = content_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let shared = words_a.intersection(&words_b).count();
    shared as f32 / words_a.len().min(words_b.len()) as f32
}

fn is_duplicate(a: &Statement, b: &Statement, preprocessor: Option<&Preprocessor>) -> bool {
    similarity_ratio(&a.statement, &b.statement) >= SIMILARITY_THRESHOLD
        && entity_overlap(&a.statement, &b.statement, preprocessor) >= ENTITY_OVERLAP_THRESHOLD
}

/// Merges `incoming` into `kept` per the consolidation rules: keep the
/// longer statement text, union the cloze candidates in first-occurrence
/// order, prefer the non-null verbatim and the longer enhanced context, and
/// prefer critique provenance.
fn merge(kept: &mut Statement, incoming: Statement) {
    if incoming.statement.len() > kept.statement.len() {
        kept.statement = incoming.statement;
    }
    for candidate in incoming.cloze_candidates {
        if !kept.cloze_candidates.contains(&candidate) {
            kept.cloze_candidates.push(candidate);
        }
    }
    // Candidates must stay exact substrings of the surviving text.
    let text = kept.statement.clone();
    kept.cloze_candidates.retain(|candidate| text.contains(candidate));

    if kept.extra_field_verbatim.is_none() {
        kept.extra_field_verbatim = incoming.extra_field_verbatim;
    }
    let incoming_longer = match (&kept.extra_field_enhanced, &incoming.extra_field_enhanced) {
        (Some(existing), Some(candidate)) => candidate.len() > existing.len(),
        (None, Some(_)) => true,
        _ => false,
    };
    if incoming_longer {
        kept.extra_field_enhanced = incoming.extra_field_enhanced;
    }
    if incoming.provenance == Provenance::Critique {
        kept.provenance = Provenance::Critique;
    }
    kept.resolve_context();
}

/// Consolidates near-duplicates across (and within) the two streams.
///
/// Insertion order is preserved for survivors; a key-points statement that
/// merges into a critique statement keeps critique provenance and lands in
/// `from_critique`.
#[must_use]
pub fn consolidate(statements: TrueStatements, preprocessor: Option<&Preprocessor>) -> TrueStatements {
    let mut kept: Vec<Statement> = Vec::new();
    let incoming = statements
        .from_critique
        .into_iter()
        .chain(statements.from_key_points);

    for statement in incoming {
        let duplicate_of = kept
            .iter()
            .position(|existing| is_duplicate(existing, &statement, preprocessor));
        match duplicate_of {
            Some(index) => {
                tracing::debug!(
                    "consolidating near-duplicate statement: '{}'",
                    statement.statement
                );
                merge(&mut kept[index], statement);
            }
            None => kept.push(statement),
        }
    }

    let mut result = TrueStatements::default();
    for statement in kept {
        match statement.provenance {
            Provenance::Critique => result.from_critique.push(statement),
            Provenance::KeyPoints => result.from_key_points.push(statement),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(text: &str, provenance: Provenance) -> Statement {
        Statement::new(text.to_string(), provenance)
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert!((similarity_ratio("abc", "abc") - 1.0).abs() < f32::EPSILON);
        assert!(similarity_ratio("abc", "xyz") < 0.01);
        assert!(similarity_ratio("", "abc") < f32::EPSILON);
    }

    #[test]
    fn test_near_duplicates_merge_across_streams() {
        let mut a = statement(
            "First-line therapy for CKD-associated hypertension is an ACE inhibitor.",
            Provenance::Critique,
        );
        a.cloze_candidates = vec!["ACE inhibitor".to_string()];
        let mut b = statement(
            "First-line therapy for CKD-associated hypertension is an ACE inhibitor",
            Provenance::KeyPoints,
        );
        b.cloze_candidates = vec!["First-line".to_string(), "ACE inhibitor".to_string()];

        let input = TrueStatements {
            from_critique: vec![a],
            from_key_points: vec![b],
        };
        let result = consolidate(input, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result.from_critique.len(), 1);
        let merged = &result.from_critique[0];
        assert_eq!(merged.provenance, Provenance::Critique);
        assert_eq!(
            merged.cloze_candidates,
            ["ACE inhibitor".to_string(), "First-line".to_string()]
        );
    }

    #[test]
    fn test_distinct_statements_survive() {
        let input = TrueStatements {
            from_critique: vec![statement(
                "Beta blockers reduce mortality after myocardial infarction.",
                Provenance::Critique,
            )],
            from_key_points: vec![statement(
                "Colonoscopy is the preferred screening test for colorectal cancer.",
                Provenance::KeyPoints,
            )],
        };
        let result = consolidate(input, None);
        assert_eq!(result.len(), 2);
        assert_eq!(result.from_key_points.len(), 1);
    }

    #[test]
    fn test_merge_keeps_longer_text_and_context() {
        let mut short = statement(
            "Warfarin requires regular INR monitoring.",
            Provenance::KeyPoints,
        );
        short.extra_field_verbatim = Some("Narrow therapeutic window.".to_string());
        let long = statement(
            "Warfarin requires regular INR monitoring checks.",
            Provenance::Critique,
        );

        let input = TrueStatements {
            from_critique: vec![long],
            from_key_points: vec![short],
        };
        let result = consolidate(input, None);
        assert_eq!(result.len(), 1);
        let merged = &result.from_critique[0];
        assert!(merged.statement.contains("checks"));
        assert_eq!(
            merged.extra_field_verbatim.as_deref(),
            Some("Narrow therapeutic window.")
        );
    }

    #[test]
    fn test_candidates_remain_substrings_after_merge() {
        let mut a = statement("Metformin is first-line therapy for diabetes.", Provenance::Critique);
        a.cloze_candidates = vec!["Metformin".to_string()];
        let mut b = statement("Metformin is first line therapy for diabetes", Provenance::KeyPoints);
        b.cloze_candidates = vec!["first line".to_string()];

        let input = TrueStatements {
            from_critique: vec![a],
            from_key_points: vec![b],
        };
        let result = consolidate(input, None);
        for statement in result.iter() {
            for candidate in &statement.cloze_candidates {
                assert!(statement.statement.contains(candidate));
            }
        }
    }
}
