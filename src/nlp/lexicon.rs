//! Medical term lexicon.
//!
//! The "model" consumed by the preprocessor is a directory of term lists,
//! one file per coarse entity type (`conditions.txt`, `medications.txt`,
//! `tests.txt`, `anatomy.txt`, optional `other.txt`), one surface form per
//! line with `#` comments. Matching is case-insensitive, word-bounded, and
//! longest-match-first.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coarse entity taxonomy the broad biomedical types collapse to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Disease or clinical finding.
    Condition,
    /// Drug or drug class.
    Medication,
    /// Diagnostic test or procedure.
    Test,
    /// Anatomical structure.
    Anatomy,
    /// Everything else the lexicon carries.
    Other,
}

impl EntityKind {
    /// Returns the kind as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Medication => "medication",
            Self::Test => "test",
            Self::Anatomy => "anatomy",
            Self::Other => "other",
        }
    }

    /// Relative weight used for salience ranking in prompt guidance.
    #[must_use]
    pub const fn salience_weight(self) -> f32 {
        match self {
            Self::Condition => 3.0,
            Self::Medication => 2.5,
            Self::Test => 2.0,
            Self::Anatomy | Self::Other => 1.0,
        }
    }
}

/// A detected medical entity with its byte span in the analyzed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalEntity {
    /// Surface text as it appears in the source.
    pub text: String,
    /// Coarse entity type.
    pub kind: EntityKind,
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
}

/// In-memory term lexicon, sorted longest-first for greedy matching.
#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Lowercased terms paired with their kind, longest first.
    terms: Vec<(String, EntityKind)>,
}

const KIND_FILES: &[(&str, EntityKind)] = &[
    ("conditions.txt", EntityKind::Condition),
    ("medications.txt", EntityKind::Medication),
    ("tests.txt", EntityKind::Test),
    ("anatomy.txt", EntityKind::Anatomy),
    ("other.txt", EntityKind::Other),
];

impl Lexicon {
    /// Loads the lexicon from a model directory.
    ///
    /// `conditions.txt`, `medications.txt`, `tests.txt`, and `anatomy.txt`
    /// must exist; `other.txt` is optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the directory or a required file is
    /// missing or unreadable.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::io(
                "load_lexicon",
                format!("'{}' is not a directory", dir.display()),
            ));
        }
        let mut pairs = Vec::new();
        for (file, kind) in KIND_FILES {
            let path = dir.join(file);
            let optional = *kind == EntityKind::Other;
            if optional && !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::io("load_lexicon", format!("{}: {e}", path.display()))
            })?;
            for line in content.lines() {
                let term = line.trim();
                if term.is_empty() || term.starts_with('#') {
                    continue;
                }
                pairs.push((term.to_lowercase(), *kind));
            }
        }
        Ok(Self::from_pairs(pairs))
    }

    /// Builds a lexicon from explicit term/kind pairs (used by tests).
    #[must_use]
    pub fn from_terms<'a>(terms: impl IntoIterator<Item = (&'a str, EntityKind)>) -> Self {
        Self::from_pairs(
            terms
                .into_iter()
                .map(|(term, kind)| (term.to_lowercase(), kind))
                .collect(),
        )
    }

    fn from_pairs(mut pairs: Vec<(String, EntityKind)>) -> Self {
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        pairs.dedup_by(|a, b| a.0 == b.0);
        Self { terms: pairs }
    }

    /// Number of terms loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the lexicon carries no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Finds all non-overlapping entity matches in `text`.
    ///
    /// Longer terms win over shorter ones at the same position; earlier
    /// matches win ties. Matches are word-bounded on both sides.
    #[must_use]
    pub fn find_entities(&self, text: &str) -> Vec<MedicalEntity> {
        let lowered = text.to_lowercase();
        // Lowercasing can change byte lengths for a handful of non-ASCII
        // characters; fall back to span-guarded extraction below.
        let haystack = lowered.as_str();

        let mut matches: Vec<(usize, usize, EntityKind)> = Vec::new();
        for (term, kind) in &self.terms {
            let mut from = 0;
            while let Some(found) = haystack[from..].find(term.as_str()) {
                let start = from + found;
                let end = start + term.len();
                if is_word_bounded(haystack, start, end) {
                    matches.push((start, end, *kind));
                }
                from = start + 1;
                if from >= haystack.len() {
                    break;
                }
            }
        }

        matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

        let mut entities = Vec::new();
        let mut covered_until = 0;
        for (start, end, kind) in matches {
            if start < covered_until {
                continue;
            }
            if let Some(surface) = text.get(start..end) {
                entities.push(MedicalEntity {
                    text: surface.to_string(),
                    kind,
                    start,
                    end,
                });
                covered_until = end;
            }
        }
        entities
    }
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
    let after_ok = end >= text.len()
        || text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
    before_ok && after_ok
}
