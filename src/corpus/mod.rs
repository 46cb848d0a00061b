//! Question file handling: discovery, schema validation, non-destructive
//! augmentation, and atomic writes.
//!
//! The corpus lives at `<data_root>/<system>/<question_id>/<question_id>.json`
//! where the identifier matches `^[a-z]{2}[a-z]{2,3}\d{2}\d{3}$` (system +
//! type + two-digit year + three-digit sequence).
//!
//! Key-order caveat: unknown fields round-trip in their original order via
//! the record's preserved map, but the typed core fields serialize first, so
//! a record whose `critique` appeared after custom fields is re-encoded with
//! the core block leading.

use crate::models::QuestionRecord;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[allow(clippy::expect_used)]
static QUESTION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}[a-z]{2,3}\d{2}\d{3}$").expect("pattern is valid"));

/// Whether `candidate` is a well-formed question identifier.
#[must_use]
pub fn is_question_id(candidate: &str) -> bool {
    QUESTION_ID_RE.is_match(candidate)
}

/// The two-letter system code prefix of an identifier.
#[must_use]
pub fn system_code(question_id: &str) -> &str {
    question_id.get(..2).unwrap_or(question_id)
}

/// Filesystem access to the question corpus.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    data_root: PathBuf,
}

impl QuestionStore {
    /// A store rooted at `data_root`.
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// The corpus root.
    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Path of one question file.
    #[must_use]
    pub fn question_path(&self, question_id: &str) -> PathBuf {
        self.data_root
            .join(system_code(question_id))
            .join(question_id)
            .join(format!("{question_id}.json"))
    }

    /// Discovers every question identifier in the corpus, sorted.
    ///
    /// Walks exactly two directory levels and collects files matching
    /// `<system>/<question_id>/<question_id>.json`.
    pub fn discover(&self) -> Result<Vec<String>> {
        self.discover_filtered(None)
    }

    /// Discovers identifiers whose system code matches `system`.
    pub fn discover_system(&self, system: &str) -> Result<Vec<String>> {
        self.discover_filtered(Some(system))
    }

    fn discover_filtered(&self, system: Option<&str>) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let systems = fs::read_dir(&self.data_root).map_err(|e| {
            Error::io(
                "discover_questions",
                format!("{}: {e}", self.data_root.display()),
            )
        })?;

        for system_entry in systems.flatten() {
            if !system_entry.path().is_dir() {
                continue;
            }
            let system_name = system_entry.file_name().to_string_lossy().to_string();
            if system.is_some_and(|wanted| wanted != system_name) {
                continue;
            }
            let Ok(questions) = fs::read_dir(system_entry.path()) else {
                continue;
            };
            for question_entry in questions.flatten() {
                let question_id = question_entry.file_name().to_string_lossy().to_string();
                if !is_question_id(&question_id) || system_code(&question_id) != system_name {
                    continue;
                }
                if question_entry
                    .path()
                    .join(format!("{question_id}.json"))
                    .is_file()
                {
                    found.push(question_id);
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Reads and schema-validates one question record.
    ///
    /// # Errors
    ///
    /// - [`Error::OperationFailed`] when the file is missing or unreadable
    /// - [`Error::Schema`] when the JSON is malformed (the cause carries the
    ///   decoder's line/column) or the identifier does not match the path
    pub fn read(&self, question_id: &str) -> Result<QuestionRecord> {
        let path = self.question_path(question_id);
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::io("read_question", format!("{}: {e}", path.display())))?;

        let record: QuestionRecord =
            serde_json::from_str(&content).map_err(|e| Error::Schema {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?;

        if record.question_id != question_id {
            return Err(Error::Schema {
                path: path.display().to_string(),
                cause: format!(
                    "question_id '{}' does not match file path",
                    record.question_id
                ),
            });
        }
        Ok(record)
    }

    /// Writes a record atomically: serialize to `<path>.tmp` in the same
    /// directory, fsync, then rename over the target. The rename is the
    /// commit point, so a failed write leaves the original untouched.
    pub fn write(&self, record: &QuestionRecord) -> Result<()> {
        let path = self.question_path(&record.question_id);
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| Error::io("encode_question", e))?;
        write_atomic(&path, json.as_bytes())
    }
}

/// Shared atomic-write primitive, also used by the checkpoint manager.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let mut tmp = File::create(&tmp_path)
        .map_err(|e| Error::io("write_tmp", format!("{}: {e}", tmp_path.display())))?;
    tmp.write_all(bytes)
        .map_err(|e| Error::io("write_tmp", format!("{}: {e}", tmp_path.display())))?;
    tmp.sync_all()
        .map_err(|e| Error::io("fsync_tmp", format!("{}: {e}", tmp_path.display())))?;
    drop(tmp);
    fs::rename(&tmp_path, path).map_err(|e| {
        Error::io(
            "commit_rename",
            format!("{} -> {}: {e}", tmp_path.display(), path.display()),
        )
    })
}
