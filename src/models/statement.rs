//! Statement types emitted by the extraction stages.

use serde::{Deserialize, Serialize};

/// Which extraction stream produced a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Extracted from the critique text.
    Critique,
    /// Extracted from the key-points list.
    KeyPoints,
}

impl Provenance {
    /// Returns the provenance as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critique => "critique",
            Self::KeyPoints => "key_points",
        }
    }
}

/// Which extra-field variant is the effective explanation for a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Only the verbatim context is present.
    Verbatim,
    /// Only the enhanced context is present.
    Enhanced,
    /// Both are present; the enhanced text is the effective one.
    Hybrid,
    /// Neither variant is present.
    #[default]
    None,
}

impl ContextSource {
    /// Returns the context source as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbatim => "verbatim",
            Self::Enhanced => "enhanced",
            Self::Hybrid => "hybrid",
            Self::None => "none",
        }
    }
}

/// A single flashcard-ready declarative sentence with cloze candidates.
///
/// `statement` never carries cloze markup; candidates are exact contiguous
/// substrings identified for later blanking by a downstream tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// The complete declarative sentence.
    pub statement: String,
    /// Explanation copied verbatim from the source, when the source provides
    /// one.
    pub extra_field_verbatim: Option<String>,
    /// Explanation generated by the context-enhancement stage.
    pub extra_field_enhanced: Option<String>,
    /// The effective context string, chosen by `context_source`.
    pub extra_field: Option<String>,
    /// Which extra-field variant is effective.
    pub context_source: ContextSource,
    /// Exact contiguous substrings of `statement` selected for blanking.
    pub cloze_candidates: Vec<String>,
    /// Which extraction stream produced this statement.
    pub provenance: Provenance,
}

impl Statement {
    /// Creates a bare statement with no context and no candidates.
    #[must_use]
    pub const fn new(statement: String, provenance: Provenance) -> Self {
        Self {
            statement,
            extra_field_verbatim: None,
            extra_field_enhanced: None,
            extra_field: None,
            context_source: ContextSource::None,
            cloze_candidates: Vec::new(),
            provenance,
        }
    }

    /// Recomputes `context_source` and `extra_field` from the two variants.
    ///
    /// Invariant: `hybrid` iff both variants are non-null, in which case the
    /// enhanced text is effective; `verbatim`/`enhanced` when exactly one is
    /// present; `none` otherwise.
    pub fn resolve_context(&mut self) {
        let (source, effective) = match (&self.extra_field_verbatim, &self.extra_field_enhanced) {
            (Some(_), Some(enhanced)) => (ContextSource::Hybrid, Some(enhanced.clone())),
            (Some(verbatim), None) => (ContextSource::Verbatim, Some(verbatim.clone())),
            (None, Some(enhanced)) => (ContextSource::Enhanced, Some(enhanced.clone())),
            (None, None) => (ContextSource::None, None),
        };
        self.context_source = source;
        self.extra_field = effective;
    }
}

/// Output container: statements split by provenance, insertion order kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueStatements {
    /// Statements extracted from the critique.
    pub from_critique: Vec<Statement>,
    /// Statements extracted from the key points.
    pub from_key_points: Vec<Statement>,
}

impl TrueStatements {
    /// Total number of statements across both streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.from_critique.len() + self.from_key_points.len()
    }

    /// Whether both streams are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from_critique.is_empty() && self.from_key_points.is_empty()
    }

    /// Iterates over both streams in order, critique first.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.from_critique.iter().chain(self.from_key_points.iter())
    }
}
