//! Prompt templates are data.
//!
//! Each extraction stage loads a named template, interpolates `{placeholder}`
//! variables, and sends the result to the provider. Defaults are embedded at
//! compile time; `MKSAP_PROMPTS_DIR` may override any template with an
//! on-disk `<name>.txt` file. Editing a template is a behavior change; the
//! response-cache key intentionally does not include a template version, so
//! cached answers can outlive an edit until the TTL expires.

use crate::{Error, Result};
use std::path::PathBuf;

/// Embedded default templates, keyed by stage name.
const EMBEDDED: &[(&str, &str)] = &[
    (
        "critique_extraction",
        include_str!("templates/critique_extraction.txt"),
    ),
    (
        "key_points_extraction",
        include_str!("templates/key_points_extraction.txt"),
    ),
    (
        "cloze_identification",
        include_str!("templates/cloze_identification.txt"),
    ),
    (
        "context_enhancement",
        include_str!("templates/context_enhancement.txt"),
    ),
];

/// Loads and renders stage prompt templates.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    overrides_dir: Option<PathBuf>,
}

impl PromptLibrary {
    /// A library with optional on-disk overrides.
    #[must_use]
    pub const fn new(overrides_dir: Option<PathBuf>) -> Self {
        Self { overrides_dir }
    }

    /// Loads the template registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown template name or an
    /// unreadable override file.
    pub fn load(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.overrides_dir {
            let path = dir.join(format!("{name}.txt"));
            if path.is_file() {
                return std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read prompt override '{}': {e}",
                        path.display()
                    ))
                });
            }
        }
        EMBEDDED
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, template)| (*template).to_string())
            .ok_or_else(|| Error::Config(format!("unknown prompt template '{name}'")))
    }

    /// Loads `name` and replaces each `{placeholder}` with its value.
    ///
    /// Unmatched placeholders are left in place so a missing variable is
    /// visible in the rendered prompt rather than silently blank.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let mut rendered = self.load(name)?;
        for (key, value) in vars {
            rendered = rendered.replace(&format!("{{{key}}}"), value);
        }
        Ok(rendered)
    }
}
