//! Rule-based sentence segmentation with byte-offset spans.

/// A segmented sentence span over the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    /// The sentence text, trimmed.
    pub text: String,
    /// Byte offset of the trimmed start in the source.
    pub start: usize,
    /// Byte offset one past the trimmed end.
    pub end: usize,
}

/// Abbreviations that a trailing period does not terminate.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "dr", "mr", "mrs", "ms", "st", "no", "fig", "approx", "spp", "mg",
    "mcg", "ml", "dl",
];

/// Segments `text` into sentences.
///
/// A sentence ends at `.`, `!`, or `?` when the period is not part of a
/// decimal number or a known abbreviation and the following character (after
/// whitespace and closing quotes) starts a new sentence or the text ends.
/// Newlines that separate list items also terminate sentences.
#[must_use]
pub fn segment(text: &str) -> Vec<SentenceSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut sentence_start = 0;

    let mut iter = text.char_indices().peekable();
    while let Some((idx, c)) = iter.next() {
        let is_terminal = matches!(c, '.' | '!' | '?');
        let is_newline_break = c == '\n' && {
            // A blank line or a bullet-style line break ends the sentence.
            let rest = &text[idx + 1..];
            rest.starts_with('\n') || rest.trim_start().starts_with('-')
        };

        if !is_terminal && !is_newline_break {
            continue;
        }

        if c == '.' {
            if is_decimal_point(bytes, idx) {
                continue;
            }
            if is_abbreviation(text, idx) {
                continue;
            }
        }

        // Include closing quotes/parens in the sentence.
        let mut end = idx + c.len_utf8();
        while let Some((next_idx, next_c)) = iter.peek().copied() {
            if matches!(next_c, '"' | '\'' | ')' | ']') {
                end = next_idx + next_c.len_utf8();
                iter.next();
            } else {
                break;
            }
        }

        if is_terminal && !starts_new_sentence(&text[end..]) {
            continue;
        }

        push_span(text, sentence_start, end, &mut spans);
        sentence_start = end;
    }

    push_span(text, sentence_start, text.len(), &mut spans);
    spans
}

fn is_decimal_point(bytes: &[u8], idx: usize) -> bool {
    idx > 0
        && idx + 1 < bytes.len()
        && bytes[idx - 1].is_ascii_digit()
        && bytes[idx + 1].is_ascii_digit()
}

fn is_abbreviation(text: &str, idx: usize) -> bool {
    let before = &text[..idx];
    let word_start = before
        .rfind(|c: char| c.is_whitespace() || c == '(')
        .map_or(0, |p| p + 1);
    let word = before[word_start..].trim_end_matches('.').to_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}

fn starts_new_sentence(rest: &str) -> bool {
    let trimmed = rest.trim_start();
    trimmed.is_empty()
        || trimmed
            .chars()
            .next()
            .map_or(true, |c| c.is_uppercase() || c.is_ascii_digit() || c == '(')
}

fn push_span(text: &str, start: usize, end: usize, spans: &mut Vec<SentenceSpan>) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    let trimmed_start = start + lead;
    spans.push(SentenceSpan {
        text: trimmed.to_string(),
        start: trimmed_start,
        end: trimmed_start + trimmed.len(),
    });
}
