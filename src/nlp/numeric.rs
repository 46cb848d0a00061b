//! Numeric-unit token extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A numeric token with optional comparator and unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericToken {
    /// The full matched surface form, e.g. `>140/90 mmHg`.
    pub raw: String,
    /// Comparator when present (`<`, `>`, `≤`, `≥`, `=`).
    pub comparator: Option<String>,
    /// The number, decimal, or ratio.
    pub value: String,
    /// Adjacent unit token when present.
    pub unit: Option<String>,
}

/// Comparator, number (integer, decimal, or ratio), and adjacent unit.
///
/// The unit alternation lists clinical units longest-first; a bare number
/// with no recognized unit still yields a token so validators can flag
/// unitless clozes.
#[allow(clippy::expect_used)]
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?P<comp>[<>≤≥=]|less\ than\ or\ equal\ to|greater\ than\ or\ equal\ to|less\ than|greater\ than)?
        \s*
        (?P<num>\d+(?:\.\d+)?(?:/\d+(?:\.\d+)?)?)
        \s*
        (?P<unit>
            mL/min/1\.73\ m2|cells/(?:µ|mc)L|mg/dL|g/dL|ng/mL|pg/mL|mEq/L|mmol/L|mIU/L|mOsm/kg|
            U/L|mmHg|bpm|mcg|µg|mg|g(?:rams)?|kg|dL|mL|L|mm|cm|%|percent|
            years?|months?|weeks?|days?|hours?|minutes?
        )?
        ",
    )
    .expect("numeric token pattern is valid")
});

/// Extracts numeric-unit tokens from `text`.
#[must_use]
pub fn extract(text: &str) -> Vec<NumericToken> {
    NUMERIC_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let num = caps.name("num")?;
            let comparator = caps.name("comp").map(|m| normalize_comparator(m.as_str()));
            let full = caps.get(0)?;
            let mut unit = caps.name("unit").map(|m| m.as_str().to_string());
            let mut end = full.end();
            // The regex crate has no lookahead; reject unit matches that sit
            // inside a longer word (e.g. "mm" inside "mmol").
            if unit.is_some() {
                let next_is_word = text[end..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphanumeric);
                if next_is_word {
                    unit = None;
                    end = num.end();
                }
            }
            Some(NumericToken {
                raw: text[full.start()..end].trim().to_string(),
                comparator,
                value: num.as_str().to_string(),
                unit,
            })
        })
        .collect()
}

fn normalize_comparator(raw: &str) -> String {
    match raw {
        "less than" => "<".to_string(),
        "greater than" => ">".to_string(),
        "less than or equal to" => "≤".to_string(),
        "greater than or equal to" => "≥".to_string(),
        other => other.to_string(),
    }
}
