//! Pipeline orchestrator.
//!
//! Drives the fixed stage sequence over a single question: load, NLP,
//! critique extraction, key-points extraction, cloze identification, context
//! enhancement, normalization, consolidation, validation, augment-and-write.
//! Stages are strictly sequential; each consumes the previous stage's
//! output.
//!
//! Question-level failures (schema, extraction, filesystem, exhausted
//! retries) become a failed [`ProcessingResult`]; run-fatal errors
//! (provider limit, authentication, configuration, interruption) propagate
//! to the run driver.

use crate::config::Config;
use crate::corpus::QuestionStore;
use crate::extract::{cloze, context, critique, key_points};
use crate::llm::LlmClient;
use crate::models::{
    NlpAnalysis, ProcessingResult, QuestionRecord, Severity, Statement, TrueStatements,
};
use crate::nlp::{NlpBundle, Preprocessor, SourceRole};
use crate::prompts::PromptLibrary;
use crate::text::{consolidate, normalize};
use crate::validate::{QuestionContext, ValidatorRegistry};
use crate::{Error, Result};
use std::sync::Arc;

/// Per-call processing options set by the run driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Augment even when `true_statements` is already present.
    pub overwrite: bool,
    /// Render prompts and run NLP, but make no provider calls and no writes.
    pub dry_run: bool,
}

/// The six-stage pipeline over one question.
pub struct Orchestrator {
    client: LlmClient,
    prompts: PromptLibrary,
    preprocessor: Option<Arc<Preprocessor>>,
    validators: ValidatorRegistry,
    store: QuestionStore,
    temperature: f32,
    enhance_context: bool,
}

impl Orchestrator {
    /// Builds the orchestrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown provider.
    pub fn new(config: &Config) -> Result<Self> {
        let preprocessor = if config.hybrid_pipeline {
            Preprocessor::shared(config.nlp_model_dir.as_deref())
        } else {
            None
        };
        Ok(Self {
            client: LlmClient::from_config(config)?,
            prompts: PromptLibrary::new(config.prompts_dir.clone()),
            preprocessor,
            validators: ValidatorRegistry::with_defaults(),
            store: QuestionStore::new(config.data_root.clone()),
            temperature: config.llm.temperature,
            enhance_context: config.enhance_context,
        })
    }

    /// Builds an orchestrator over explicit collaborators (used by tests).
    #[must_use]
    pub fn with_parts(
        client: LlmClient,
        prompts: PromptLibrary,
        preprocessor: Option<Arc<Preprocessor>>,
        validators: ValidatorRegistry,
        store: QuestionStore,
        temperature: f32,
        enhance_context: bool,
    ) -> Self {
        Self {
            client,
            prompts,
            preprocessor,
            validators,
            store,
            temperature,
            enhance_context,
        }
    }

    /// The composed LLM client.
    #[must_use]
    pub const fn client(&self) -> &LlmClient {
        &self.client
    }

    /// The question store.
    #[must_use]
    pub const fn store(&self) -> &QuestionStore {
        &self.store
    }

    /// Processes one question.
    ///
    /// # Errors
    ///
    /// Only run-fatal errors surface as `Err`; everything else is folded
    /// into a failed [`ProcessingResult`].
    pub fn process(&self, question_id: &str, options: ProcessOptions) -> Result<ProcessingResult> {
        let calls_before = self.client.api_calls();
        match self.run_stages(question_id, options) {
            Ok(result) => Ok(result),
            Err(
                err @ (Error::ProviderLimit { .. }
                | Error::ProviderAuth { .. }
                | Error::Config(_)
                | Error::Interrupted),
            ) => Err(err),
            Err(err) => {
                let api_calls = self.client.api_calls() - calls_before;
                tracing::warn!(question_id, "question failed: {err}");
                Ok(ProcessingResult::failed(question_id, err.to_string(), api_calls))
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn run_stages(&self, question_id: &str, options: ProcessOptions) -> Result<ProcessingResult> {
        let calls_before = self.client.api_calls();

        // Stage 1: load; skip cleanly when already augmented.
        let mut record = self.store.read(question_id)?;
        if record.has_statements() && !options.overwrite {
            tracing::info!(question_id, "already has true_statements, skipping");
            return Ok(ProcessingResult::succeeded(question_id, 0, 0));
        }

        // Stage 2: NLP preprocessing over both source texts.
        let key_points_text = record.key_points.join("\n");
        let critique_nlp = self.analyze(&record.critique, SourceRole::Critique);
        let key_points_nlp = self.analyze(&key_points_text, SourceRole::KeyPoints);

        if options.dry_run {
            self.render_dry_run(&record, &critique_nlp, &key_points_nlp)?;
            let api_calls = self.client.api_calls() - calls_before;
            return Ok(ProcessingResult::succeeded(question_id, 0, api_calls));
        }

        // Stages 3-4: the two extraction streams.
        let mut from_critique = critique::extract(
            &self.client,
            &self.prompts,
            &record.critique,
            record.educational_objective(),
            critique_nlp.as_ref(),
            self.temperature,
        )?;
        let mut from_key_points = key_points::extract(
            &self.client,
            &self.prompts,
            &record.key_points,
            key_points_nlp.as_ref(),
            self.temperature,
        )?;

        // Stage 5: cloze identification over the merged, numbered list.
        {
            let mut merged: Vec<&mut Statement> = from_critique
                .iter_mut()
                .chain(from_key_points.iter_mut())
                .collect();
            cloze::identify(&self.client, &self.prompts, &mut merged, self.temperature)?;
        }

        // Stage 6: context enhancement per stream.
        context::apply(
            &self.client,
            &self.prompts,
            &mut from_critique,
            &record.critique,
            self.enhance_context,
            self.temperature,
        )?;
        context::apply(
            &self.client,
            &self.prompts,
            &mut from_key_points,
            &key_points_text,
            self.enhance_context,
            self.temperature,
        )?;

        // Stage 7: normalize, then consolidate across streams.
        for statement in from_critique.iter_mut().chain(from_key_points.iter_mut()) {
            normalize_statement(statement);
        }
        let statements = consolidate(
            TrueStatements {
                from_critique,
                from_key_points,
            },
            self.preprocessor.as_deref(),
        );

        // Stage 8: validators.
        let question_context = QuestionContext {
            critique_text: &record.critique,
            key_points_text: &key_points_text,
            critique_nlp: critique_nlp.as_ref(),
            key_points_nlp: key_points_nlp.as_ref(),
            preprocessor: self.preprocessor.as_deref(),
        };
        let issues = self.validators.run(&statements, &question_context);
        let validation_pass = ValidatorRegistry::verdict(&issues);
        for issue in &issues {
            match issue.severity {
                Severity::Error => tracing::warn!(
                    question_id,
                    category = %issue.category,
                    location = %issue.location,
                    "validation error: {}",
                    issue.message
                ),
                Severity::Warning | Severity::Info => tracing::info!(
                    question_id,
                    category = %issue.category,
                    location = %issue.location,
                    "validation {}: {}",
                    issue.severity.as_str(),
                    issue.message
                ),
            }
        }

        // Stage 9: augment and write atomically.
        let extracted = statements.len();
        record.true_statements = Some(statements);
        record.validation_pass = Some(validation_pass);
        record.nlp_analysis = self.nlp_summary(critique_nlp.as_ref(), key_points_nlp.as_ref());
        self.store.write(&record)?;

        let api_calls = self.client.api_calls() - calls_before;
        tracing::info!(
            question_id,
            statements = extracted,
            api_calls,
            validation_pass,
            "question processed"
        );
        Ok(ProcessingResult::succeeded(question_id, extracted, api_calls)
            .with_verdict(validation_pass))
    }

    fn analyze(&self, text: &str, role: SourceRole) -> Option<NlpBundle> {
        self.preprocessor
            .as_ref()
            .map(|preprocessor| preprocessor.analyze(text, role))
    }

    /// Dry run exercises template rendering and NLP guidance without
    /// dispatching to the provider or touching any file.
    fn render_dry_run(
        &self,
        record: &QuestionRecord,
        critique_nlp: &Option<NlpBundle>,
        key_points_nlp: &Option<NlpBundle>,
    ) -> Result<()> {
        use crate::extract::format_nlp_guidance;

        let guidance = format_nlp_guidance(critique_nlp.as_ref());
        let prompt = self.prompts.render(
            critique::STAGE,
            &[
                ("critique", record.critique.as_str()),
                (
                    "educational_objective",
                    record.educational_objective().unwrap_or("(none provided)"),
                ),
                ("nlp_guidance", &guidance),
            ],
        )?;
        tracing::debug!(
            question_id = %record.question_id,
            chars = prompt.len(),
            "dry-run rendered critique prompt"
        );

        if !record.key_points.is_empty() {
            let listed = record.key_points.join("\n- ");
            let guidance = format_nlp_guidance(key_points_nlp.as_ref());
            let prompt = self.prompts.render(
                key_points::STAGE,
                &[("key_points", listed.as_str()), ("nlp_guidance", &guidance)],
            )?;
            tracing::debug!(
                question_id = %record.question_id,
                chars = prompt.len(),
                "dry-run rendered key-points prompt"
            );
        }
        Ok(())
    }

    fn nlp_summary(
        &self,
        critique_nlp: Option<&NlpBundle>,
        key_points_nlp: Option<&NlpBundle>,
    ) -> Option<NlpAnalysis> {
        match (critique_nlp, key_points_nlp) {
            (None, None) => None,
            (critique, key_points) => Some(NlpAnalysis {
                critique: critique.map(NlpBundle::counts).unwrap_or_default(),
                key_points: key_points.map(NlpBundle::counts).unwrap_or_default(),
            }),
        }
    }
}

/// Applies the deterministic normalizer to a statement's text, both context
/// variants, and its candidates, preserving the substring property.
fn normalize_statement(statement: &mut Statement) {
    statement.statement = normalize(&statement.statement);
    if let Some(verbatim) = &statement.extra_field_verbatim {
        statement.extra_field_verbatim = Some(normalize(verbatim));
    }
    if let Some(enhanced) = &statement.extra_field_enhanced {
        statement.extra_field_enhanced = Some(normalize(enhanced));
    }
    let text = statement.statement.clone();
    statement.cloze_candidates = statement
        .cloze_candidates
        .iter()
        .map(|candidate| normalize(candidate))
        .filter(|candidate| text.contains(candidate.as_str()))
        .collect();
    statement.resolve_context();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    #[test]
    fn test_normalize_statement_keeps_substring_property() {
        let mut statement = Statement::new(
            "A value less than 2 cm is reassuring.".to_string(),
            Provenance::Critique,
        );
        statement.cloze_candidates = vec!["less than 2 cm".to_string()];
        normalize_statement(&mut statement);
        assert_eq!(statement.statement, "A value <2 cm is reassuring.");
        assert_eq!(statement.cloze_candidates, ["<2 cm"]);
    }

    #[test]
    fn test_normalize_statement_resolves_context() {
        let mut statement = Statement::new("X is true.".to_string(), Provenance::KeyPoints);
        statement.extra_field_verbatim = Some("  because   of Y  ".to_string());
        normalize_statement(&mut statement);
        assert_eq!(statement.extra_field.as_deref(), Some("because of Y"));
    }
}
