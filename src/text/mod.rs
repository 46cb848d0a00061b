//! Deterministic text cleanup and duplicate consolidation.

mod consolidate;
mod normalize;

pub use consolidate::{
    consolidate, entity_overlap, similarity_ratio, ENTITY_OVERLAP_THRESHOLD, SIMILARITY_THRESHOLD,
};
pub use normalize::normalize;

use std::collections::HashSet;

/// Stopwords excluded from content-word comparisons.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "with", "without", "of", "in", "on", "at",
    "to", "by", "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "this",
    "that", "these", "those", "it", "its", "as", "from", "which", "who", "whom", "when", "where",
    "should", "would", "could", "can", "may", "might", "must", "not", "no", "than", "then", "such",
    "also", "into", "over", "under", "between", "after", "before", "during", "their", "there",
];

/// Lowercased alphanumeric tokens of `text`, minus stopwords and tokens
/// shorter than three characters.
#[must_use]
pub fn content_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 3)
        .map(str::to_lowercase)
        .filter(|token| !STOPWORDS.contains(&token.as_str()))
        .collect()
}
