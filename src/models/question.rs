//! Question record wire format.

use super::analysis::NlpAnalysis;
use super::statement::TrueStatements;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An MKSAP question record.
///
/// Only the fields the pipeline consumes or produces are typed; every other
/// field lands in the flattened `extra` map and round-trips unchanged (the
/// `preserve_order` feature of `serde_json` keeps its key order). On
/// re-encode the typed fields serialize first, then the preserved extras in
/// their original relative order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Stable identifier, `<system><type><year><seq>` (e.g. `cvmcq24001`).
    pub question_id: String,
    /// Two-letter system code.
    pub category: String,
    /// Free-text explanation of the correct answer.
    pub critique: String,
    /// Pre-curated list of takeaways (0-5 short strings).
    pub key_points: Vec<String>,
    /// Output: extracted statements split by provenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_statements: Option<TrueStatements>,
    /// Output: per-question validation verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_pass: Option<bool>,
    /// Output: compact NLP preprocessing summary (counts only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nlp_analysis: Option<NlpAnalysis>,
    /// Every field the pipeline does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl QuestionRecord {
    /// The optional one-sentence teaching goal, when present.
    ///
    /// Read from the preserved map rather than a typed field so that a
    /// `null` or absent value round-trips byte-identically.
    #[must_use]
    pub fn educational_objective(&self) -> Option<&str> {
        self.extra
            .get("educational_objective")
            .and_then(Value::as_str)
    }

    /// Whether this record already carries extracted statements.
    #[must_use]
    pub const fn has_statements(&self) -> bool {
        self.true_statements.is_some()
    }
}
