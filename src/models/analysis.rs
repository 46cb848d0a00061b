//! Persisted NLP summary (counts only, never the full bundle).

use serde::{Deserialize, Serialize};

/// Per-source-text preprocessing counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpCounts {
    /// Number of detected medical entities.
    pub entity_count: usize,
    /// Number of detected negations.
    pub negation_count: usize,
    /// Number of segmented sentences.
    pub sentence_count: usize,
    /// Number of sentences flagged as compound and needing splitting.
    pub split_candidates: usize,
}

/// NLP summary persisted alongside `true_statements`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpAnalysis {
    /// Counts for the critique text.
    pub critique: NlpCounts,
    /// Counts for the joined key points.
    pub key_points: NlpCounts,
}
