//! Graded validation issues.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Issue severity grades.
///
/// Only `Error` fails a question; warnings and info are logged for
/// inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational note.
    Info,
    /// Quality concern that does not fail the question.
    Warning,
    /// Defect that forces `validation_pass = false`.
    Error,
}

impl Severity {
    /// Returns the severity as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Registered validator categories, in their fixed run order.
///
/// `Hallucination` always runs last; `ValidatorException` is reserved for
/// validators that fail internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Required fields and declared types.
    Structure,
    /// Atomicity, vagueness, patient-specific language, length.
    Quality,
    /// Extra-field quality.
    Context,
    /// Cloze candidate count, substring property, triviality.
    Cloze,
    /// Medication specificity and numeric units.
    Ambiguity,
    /// Multi-item list handling.
    Enumeration,
    /// Source fidelity and enhanced-context grounding.
    Hallucination,
    /// A validator itself failed.
    ValidatorException,
}

impl IssueCategory {
    /// Returns the category as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Quality => "quality",
            Self::Context => "context",
            Self::Cloze => "cloze",
            Self::Ambiguity => "ambiguity",
            Self::Enumeration => "enumeration",
            Self::Hallucination => "hallucination",
            Self::ValidatorException => "validator_exception",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an issue was found: a statement index or the whole question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLocation {
    /// Zero-based index into the merged statement list.
    Statement(usize),
    /// The issue applies to the question as a whole.
    Global,
}

impl Serialize for IssueLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Statement(index) => serializer.serialize_u64(*index as u64),
            Self::Global => serializer.serialize_str("global"),
        }
    }
}

impl<'de> Deserialize<'de> for IssueLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LocationVisitor;

        impl Visitor<'_> for LocationVisitor {
            type Value = IssueLocation;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a statement index or the string \"global\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<IssueLocation, E> {
                usize::try_from(value)
                    .map(IssueLocation::Statement)
                    .map_err(|_| E::custom("statement index out of range"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<IssueLocation, E> {
                if value == "global" {
                    Ok(IssueLocation::Global)
                } else {
                    Err(E::custom(format!("unknown location '{value}'")))
                }
            }
        }

        deserializer.deserialize_any(LocationVisitor)
    }
}

impl fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statement(index) => write!(f, "{index}"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// One graded finding from a validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// The registered category this issue belongs to.
    pub category: IssueCategory,
    /// Issue severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Statement index or `"global"`.
    pub location: IssueLocation,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates an issue with no suggestion.
    #[must_use]
    pub fn new(
        category: IssueCategory,
        severity: Severity,
        message: impl Into<String>,
        location: IssueLocation,
    ) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            location,
            suggestion: None,
        }
    }

    /// Attaches a remediation hint.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_wire_form() {
        let statement = serde_json::to_value(IssueLocation::Statement(3)).unwrap();
        assert_eq!(statement, serde_json::json!(3));
        let global = serde_json::to_value(IssueLocation::Global).unwrap();
        assert_eq!(global, serde_json::json!("global"));

        let parsed: IssueLocation = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(parsed, IssueLocation::Statement(7));
        let parsed: IssueLocation = serde_json::from_value(serde_json::json!("global")).unwrap();
        assert_eq!(parsed, IssueLocation::Global);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_issue_builder() {
        let issue = ValidationIssue::new(
            IssueCategory::Cloze,
            Severity::Error,
            "no candidates",
            IssueLocation::Statement(0),
        )
        .with_suggestion("re-run cloze identification");
        assert_eq!(issue.category.as_str(), "cloze");
        assert!(issue.suggestion.is_some());
    }
}
