//! Per-sentence atomicity scoring.
//!
//! A statement is atomic when it tests exactly one fact. The score combines
//! sentence length, coordinating conjunctions joining independent clauses,
//! and medical-entity density; compound sentences become split candidates.

use super::lexicon::MedicalEntity;

/// Atomicity assessment for one sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atomicity {
    /// Score in `[0, 1]`; higher means more atomic.
    pub score: f32,
    /// Number of detected independent clauses.
    pub independent_clauses: usize,
    /// Whether the sentence should be split before carding.
    pub split_candidate: bool,
}

/// Coordinating conjunctions that can join independent clauses.
const COORDINATORS: &[&str] = &["and", "but", "or", "nor", "yet", "so"];

/// Finite-verb cues marking a clause as independent.
const VERB_CUES: &[&str] = &[
    "is", "are", "was", "were", "be", "has", "have", "had", "should", "must", "can", "may",
    "requires", "require", "reduces", "reduce", "increases", "increase", "improves", "improve",
    "causes", "cause", "indicates", "indicate", "includes", "include", "prevents", "prevent",
    "treats", "treat", "suggests", "suggest", "confirms", "confirm", "defines", "define",
    "presents", "occurs", "occur", "remains", "remain", "recommends", "recommend", "shows",
    "show", "reveals", "reveal", "warrants", "warrant",
];

/// Threshold below which a sentence is a split candidate.
pub const SPLIT_THRESHOLD: f32 = 0.5;

/// Scores one sentence.
///
/// `entities` are the entities detected within this sentence, with spans
/// relative to the sentence text.
#[must_use]
pub fn score(sentence: &str, entities: &[MedicalEntity]) -> Atomicity {
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    let clauses = independent_clauses(sentence, &tokens);

    let mut value: f32 = 1.0;
    match tokens.len() {
        0..=14 => {}
        15..=20 => value -= 0.1,
        21..=30 => value -= 0.2,
        _ => value -= 0.35,
    }
    if clauses.len() > 1 {
        value -= 0.25 * (clauses.len() - 1) as f32;
    }
    if entities.len() >= 4 {
        value -= 0.15;
    }
    let value = value.clamp(0.0, 1.0);

    let clauses_with_entities = clauses
        .iter()
        .filter(|(start, end)| entities.iter().any(|e| e.start >= *start && e.start < *end))
        .count();

    Atomicity {
        score: value,
        independent_clauses: clauses.len(),
        split_candidate: value < SPLIT_THRESHOLD
            || (clauses.len() >= 2 && clauses_with_entities >= 2),
    }
}

/// Splits the sentence at clause joints and keeps byte spans of the parts
/// that look independent (at least three tokens and a finite-verb cue).
fn independent_clauses(sentence: &str, tokens: &[&str]) -> Vec<(usize, usize)> {
    let mut boundaries = vec![0];
    let mut offset = 0;
    for token in tokens {
        let Some(found) = sentence[offset..].find(token) else {
            break;
        };
        let start = offset + found;
        let cleaned = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if COORDINATORS.contains(&cleaned.as_str()) || token.ends_with(';') {
            boundaries.push(start);
        }
        offset = start + token.len();
    }
    boundaries.push(sentence.len());

    let mut clauses = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let clause = &sentence[start..end];
        let words: Vec<String> = clause
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .collect();
        let has_verb = words.iter().any(|w| VERB_CUES.contains(&w.as_str()));
        if words.len() >= 3 && has_verb {
            clauses.push((start, end));
        }
    }
    if clauses.is_empty() {
        clauses.push((0, sentence.len()));
    }
    clauses
}
