//! Domain models.
//!
//! Wire-format types for question records and the augmented output, plus the
//! in-memory types that flow between pipeline stages.

mod analysis;
mod processing;
mod question;
mod statement;
mod validation;

pub use analysis::{NlpAnalysis, NlpCounts};
pub use processing::ProcessingResult;
pub use question::QuestionRecord;
pub use statement::{ContextSource, Provenance, Statement, TrueStatements};
pub use validation::{IssueCategory, IssueLocation, Severity, ValidationIssue};
