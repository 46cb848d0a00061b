//! Medical NLP preprocessing.
//!
//! Produces one [`NlpBundle`] per source text: segmented sentences, detected
//! medical entities (collapsed to a coarse five-type taxonomy), negations
//! with clause-bounded scopes, numeric-unit tokens, and per-sentence
//! atomicity scores with split candidates.
//!
//! The lexicon "model" is loaded once per process from the directory named
//! by `MKSAP_NLP_MODEL`. When it is unavailable the pipeline continues in
//! legacy mode: bundles are absent and downstream prompt guidance is
//! omitted. The warning is logged once at startup, not per question.

mod atomicity;
mod lexicon;
mod negation;
mod numeric;
mod sentence;

pub use atomicity::{Atomicity, SPLIT_THRESHOLD, score as score_atomicity};
pub use lexicon::{EntityKind, Lexicon, MedicalEntity};
pub use negation::{Negation, detect as detect_negations};
pub use numeric::{NumericToken, extract as extract_numeric_tokens};
pub use sentence::{SentenceSpan, segment};

use crate::models::NlpCounts;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

/// Which source text a bundle was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// The free-text critique.
    Critique,
    /// The joined key-points list.
    KeyPoints,
}

impl SourceRole {
    /// Returns the role as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critique => "critique",
            Self::KeyPoints => "key_points",
        }
    }
}

/// A segmented sentence with its atomicity assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedSentence {
    /// The sentence text.
    pub text: String,
    /// Byte offset into the source text.
    pub start: usize,
    /// Byte offset one past the end.
    pub end: usize,
    /// Atomicity score in `[0, 1]`.
    pub atomicity: f32,
    /// Whether the sentence is compound and needs splitting.
    pub split_candidate: bool,
}

/// Structured preprocessing result for one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpBundle {
    /// Which source text was analyzed.
    pub role: SourceRole,
    /// Segmented sentences in order.
    pub sentences: Vec<AnalyzedSentence>,
    /// Detected entities with byte spans into the source text.
    pub entities: Vec<MedicalEntity>,
    /// Detected negations.
    pub negations: Vec<Negation>,
    /// Numeric-unit tokens.
    pub numeric_tokens: Vec<NumericToken>,
    /// Indices into `sentences` flagged as compound fact candidates.
    pub fact_candidates: Vec<usize>,
}

impl NlpBundle {
    /// An empty bundle (legacy mode or empty input).
    #[must_use]
    pub const fn empty(role: SourceRole) -> Self {
        Self {
            role,
            sentences: Vec::new(),
            entities: Vec::new(),
            negations: Vec::new(),
            numeric_tokens: Vec::new(),
            fact_candidates: Vec::new(),
        }
    }

    /// The compact counts persisted as `nlp_analysis`.
    #[must_use]
    pub fn counts(&self) -> NlpCounts {
        NlpCounts {
            entity_count: self.entities.len(),
            negation_count: self.negations.len(),
            sentence_count: self.sentences.len(),
            split_candidates: self.fact_candidates.len(),
        }
    }

    /// Distinct entities ranked by salience (frequency times kind weight),
    /// capped at `limit`.
    #[must_use]
    pub fn top_entities(&self, limit: usize) -> Vec<&MedicalEntity> {
        let mut ranked: Vec<(f32, &MedicalEntity)> = Vec::new();
        for entity in &self.entities {
            let key = entity.text.to_lowercase();
            let frequency = self
                .entities
                .iter()
                .filter(|e| e.text.eq_ignore_ascii_case(&key))
                .count();
            if ranked
                .iter()
                .any(|(_, seen)| seen.text.eq_ignore_ascii_case(&entity.text))
            {
                continue;
            }
            let salience = frequency as f32 * entity.kind.salience_weight();
            ranked.push((salience, entity));
        }
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.into_iter().take(limit).map(|(_, e)| e).collect()
    }
}

/// Cached analysis of a single sentence; spans are sentence-relative.
#[derive(Debug, Clone)]
struct SentenceAnalysis {
    entities: Vec<MedicalEntity>,
    negations: Vec<Negation>,
    numeric_tokens: Vec<NumericToken>,
    atomicity: Atomicity,
}

/// Per-sentence cache capacity.
const SENTENCE_CACHE_CAPACITY: usize = 1024;

/// The medical NLP preprocessor.
///
/// Cheap to call after construction: the lexicon is held in memory and
/// per-sentence analyses are cached on the exact input string with LRU
/// eviction. Deterministic for a given lexicon and text.
pub struct Preprocessor {
    lexicon: Lexicon,
    cache: Mutex<LruCache<String, Arc<SentenceAnalysis>>>,
}

static SHARED: OnceLock<Option<Arc<Preprocessor>>> = OnceLock::new();

impl Preprocessor {
    /// Creates a preprocessor over an explicit lexicon.
    #[must_use]
    pub fn new(lexicon: Lexicon) -> Self {
        let capacity =
            NonZeroUsize::new(SENTENCE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            lexicon,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the process-global preprocessor, loading the lexicon on the
    /// first call.
    ///
    /// Returns `None` in legacy mode (no model directory configured, or the
    /// lexicon failed to load). The degradation warning is logged exactly
    /// once.
    #[must_use]
    pub fn shared(model_dir: Option<&Path>) -> Option<Arc<Self>> {
        SHARED
            .get_or_init(|| match model_dir {
                None => {
                    tracing::warn!(
                        "MKSAP_NLP_MODEL not set; continuing in legacy mode without NLP guidance"
                    );
                    None
                }
                Some(dir) => match Lexicon::from_dir(dir) {
                    Ok(lexicon) => {
                        tracing::info!(
                            terms = lexicon.len(),
                            model = %dir.display(),
                            "medical lexicon loaded"
                        );
                        Some(Arc::new(Self::new(lexicon)))
                    }
                    Err(e) => {
                        tracing::warn!(
                            "failed to load medical lexicon from '{}': {e}; \
                             continuing in legacy mode",
                            dir.display()
                        );
                        None
                    }
                },
            })
            .clone()
    }

    /// Analyzes one source text into a bundle.
    ///
    /// Never fails on well-formed text; empty input yields an empty bundle.
    #[must_use]
    pub fn analyze(&self, text: &str, role: SourceRole) -> NlpBundle {
        if text.trim().is_empty() {
            return NlpBundle::empty(role);
        }

        let mut bundle = NlpBundle::empty(role);
        for (index, span) in segment(text).into_iter().enumerate() {
            let analysis = self.sentence_analysis(&span.text);

            for entity in &analysis.entities {
                bundle.entities.push(MedicalEntity {
                    text: entity.text.clone(),
                    kind: entity.kind,
                    start: span.start + entity.start,
                    end: span.start + entity.end,
                });
            }
            bundle.negations.extend(analysis.negations.iter().cloned());
            bundle
                .numeric_tokens
                .extend(analysis.numeric_tokens.iter().cloned());
            if analysis.atomicity.split_candidate {
                bundle.fact_candidates.push(index);
            }
            bundle.sentences.push(AnalyzedSentence {
                text: span.text,
                start: span.start,
                end: span.end,
                atomicity: analysis.atomicity.score,
                split_candidate: analysis.atomicity.split_candidate,
            });
        }
        bundle
    }

    /// Finds medical entities in an arbitrary text without segmentation.
    ///
    /// Used by the consolidator and the hallucination validators, which work
    /// on single statements rather than full source texts.
    #[must_use]
    pub fn find_entities(&self, text: &str) -> Vec<MedicalEntity> {
        self.lexicon.find_entities(text)
    }

    /// Current number of cached sentence analyses.
    #[must_use]
    pub fn cached_sentences(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn sentence_analysis(&self, sentence: &str) -> Arc<SentenceAnalysis> {
        {
            let mut cache = self
                .cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(found) = cache.get(sentence) {
                return Arc::clone(found);
            }
        }

        let entities = self.lexicon.find_entities(sentence);
        let negations = detect_negations(sentence, &entities);
        let numeric_tokens = extract_numeric_tokens(sentence);
        let atomicity = score_atomicity(sentence, &entities);
        let analysis = Arc::new(SentenceAnalysis {
            entities,
            negations,
            numeric_tokens,
            atomicity,
        });

        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.put(sentence.to_string(), Arc::clone(&analysis));
        analysis
    }
}
