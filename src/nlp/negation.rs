//! Lexical negation detection with clause-bounded scope.

use super::lexicon::MedicalEntity;
use serde::{Deserialize, Serialize};

/// A detected negation with its scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negation {
    /// The trigger phrase as written.
    pub trigger: String,
    /// Scope text the negation applies to.
    pub scope: String,
    /// The negated entity, when one falls inside the scope.
    pub entity: Option<String>,
}

/// Multi-word triggers first so they win over their prefixes.
const TRIGGERS: &[&str] = &[
    "not recommended",
    "not indicated",
    "absence of",
    "ruled out",
    "rules out",
    "rather than",
    "instead of",
    "no evidence of",
    "without",
    "denies",
    "denied",
    "not",
    "no",
];

/// Coordinating conjunctions that end a negation scope.
const SCOPE_BREAKERS: &[&str] = &["and", "but", "or", "nor", "yet", "because", "which", "that"];

/// Maximum scope length in tokens when no clause boundary intervenes.
const MAX_SCOPE_TOKENS: usize = 6;

/// Detects negations in `text`.
///
/// The scope of a trigger extends to the next clause boundary (comma,
/// semicolon, or coordinating conjunction) or [`MAX_SCOPE_TOKENS`] tokens,
/// whichever comes first. When a detected entity's span falls inside the
/// scope, it is attributed to the negation.
#[must_use]
pub fn detect(text: &str, entities: &[MedicalEntity]) -> Vec<Negation> {
    let tokens = tokenize(text);
    let mut negations = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let Some((trigger, trigger_len)) = match_trigger(&tokens, i) else {
            i += 1;
            continue;
        };

        let scope_start = i + trigger_len;
        let mut scope_end = scope_start;
        while scope_end < tokens.len() && scope_end - scope_start < MAX_SCOPE_TOKENS {
            let token = &tokens[scope_end];
            if SCOPE_BREAKERS.contains(&token.lowered.as_str()) {
                break;
            }
            scope_end += 1;
            if token.ends_clause {
                break;
            }
        }

        if scope_end > scope_start {
            let span_start = tokens[scope_start].start;
            let span_end = tokens[scope_end - 1].end;
            let scope = text[span_start..span_end]
                .trim_end_matches([',', ';', '.'])
                .to_string();
            let entity = entities
                .iter()
                .find(|e| e.start >= span_start && e.start < span_end)
                .map(|e| e.text.clone());
            negations.push(Negation {
                trigger,
                scope,
                entity,
            });
        }

        i = scope_end.max(i + trigger_len);
    }

    negations
}

struct Token {
    lowered: String,
    start: usize,
    end: usize,
    ends_clause: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(make_token(text, s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        tokens.push(make_token(text, s, text.len()));
    }
    tokens
}

fn make_token(text: &str, start: usize, end: usize) -> Token {
    let raw = &text[start..end];
    let ends_clause = raw.ends_with([',', ';', ':', '.']);
    let lowered = raw
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    Token {
        lowered,
        start,
        end,
        ends_clause,
    }
}

fn match_trigger(tokens: &[Token], at: usize) -> Option<(String, usize)> {
    for trigger in TRIGGERS {
        let words: Vec<&str> = trigger.split(' ').collect();
        if at + words.len() > tokens.len() {
            continue;
        }
        let matched = words
            .iter()
            .enumerate()
            .all(|(offset, word)| tokens[at + offset].lowered == *word);
        // A multi-word trigger must not span a clause boundary.
        let clean = tokens[at..at + words.len().saturating_sub(1)]
            .iter()
            .all(|t| !t.ends_clause);
        if matched && clean {
            return Some(((*trigger).to_string(), words.len()));
        }
    }
    None
}
