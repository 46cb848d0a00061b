//! Deterministic symbol and whitespace normalization.
//!
//! Applied to every statement and extra field after extraction. Replacement
//! patterns are word-boundary-anchored; comparative phrases that are part of
//! clinical idioms ("greater than normal") are left untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Words that keep a spelled-out comparator as an idiom.
const IDIOM_CONTINUATIONS: &[&str] = &["normal", "expected", "usual", "baseline", "average"];

#[allow(clippy::expect_used)]
static GE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgreater than or equal to\b").expect("pattern is valid"));
#[allow(clippy::expect_used)]
static LE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bless than or equal to\b").expect("pattern is valid"));
#[allow(clippy::expect_used)]
static GT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgreater than(\s+\w+)?").expect("pattern is valid"));
#[allow(clippy::expect_used)]
static LT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bless than(\s+\w+)?").expect("pattern is valid"));
#[allow(clippy::expect_used)]
static APPROX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bapproximately\b").expect("pattern is valid"));
#[allow(clippy::expect_used)]
static PM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bplus or minus\b").expect("pattern is valid"));
/// Joins a substituted symbol tightly to a following number.
#[allow(clippy::expect_used)]
static TIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([<>≤≥~±])\s+(\d)").expect("pattern is valid"));
#[allow(clippy::expect_used)]
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("pattern is valid"));

/// Normalizes one text: symbol substitutions, whitespace collapse, trim.
#[must_use]
pub fn normalize(text: &str) -> String {
    let text = GE_RE.replace_all(text, "≥");
    let text = LE_RE.replace_all(&text, "≤");
    let text = replace_comparator(&GT_RE, &text, ">");
    let text = replace_comparator(&LT_RE, &text, "<");
    let text = APPROX_RE.replace_all(&text, "~");
    let text = PM_RE.replace_all(&text, "±");
    let text = TIGHT_RE.replace_all(&text, "$1$2");
    let text = WS_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Replaces a spelled-out comparator unless the following word makes it a
/// clinical idiom. The regex crate has no lookahead, so the following word
/// is captured and re-emitted.
fn replace_comparator(pattern: &Regex, text: &str, symbol: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let following = caps.get(1).map_or("", |m| m.as_str());
            let word = following.trim().to_lowercase();
            if IDIOM_CONTINUATIONS.contains(&word.as_str()) {
                caps.get(0).map_or("", |m| m.as_str()).to_string()
            } else {
                format!("{symbol}{following}")
            }
        })
        .into_owned()
}
