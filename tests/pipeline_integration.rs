//! End-to-end pipeline scenarios over a scripted provider and a temporary
//! corpus.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use clozegen::corpus::QuestionStore;
use clozegen::nlp::{EntityKind, Lexicon, Preprocessor};
use clozegen::pipeline::{Orchestrator, ProcessOptions};
use clozegen::prompts::PromptLibrary;
use clozegen::validate::ValidatorRegistry;
use common::{client_over, read_question_json, seed_question, MockProvider, StageResponses};
use std::sync::Arc;

fn orchestrator_with(
    data_root: &std::path::Path,
    responses: StageResponses,
    preprocessor: Option<Arc<Preprocessor>>,
    enhance_context: bool,
) -> Orchestrator {
    Orchestrator::with_parts(
        client_over(Box::new(MockProvider::new(responses))),
        PromptLibrary::default(),
        preprocessor,
        ValidatorRegistry::with_defaults(),
        QuestionStore::new(data_root),
        0.0,
        enhance_context,
    )
}

fn medical_preprocessor() -> Arc<Preprocessor> {
    Arc::new(Preprocessor::new(Lexicon::from_terms([
        ("aspirin", EntityKind::Medication),
        ("ace inhibitor", EntityKind::Medication),
        ("ace inhibitors", EntityKind::Medication),
        ("statins", EntityKind::Medication),
        ("hypertension", EntityKind::Condition),
        ("chronic cough", EntityKind::Condition),
        ("blood pressure", EntityKind::Test),
        ("tobacco cessation", EntityKind::Other),
    ])))
}

#[test]
fn minimum_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "pmmcq24001",
        "Initial evaluation of chronic cough includes discontinuing ACE inhibitors and tobacco cessation.",
        &[],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "Initial evaluation of chronic cough includes discontinuing ACE inhibitors.", "extra_field": null},
            {"statement": "Tobacco cessation belongs in the initial evaluation of chronic cough.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["ACE inhibitors"], "2": ["Tobacco cessation"]}}"#
            .to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);

    let result = orchestrator
        .process("pmmcq24001", ProcessOptions::default())
        .unwrap();
    assert!(result.success);
    assert_eq!(result.statements_extracted, 2);
    assert_eq!(result.validation_pass, Some(true));

    let json = read_question_json(dir.path(), "pmmcq24001");
    let from_critique = json["true_statements"]["from_critique"].as_array().unwrap();
    assert!(from_critique
        .iter()
        .any(|s| s["statement"].as_str().unwrap().contains("ACE inhibitors")));
    let candidates: Vec<&str> = from_critique
        .iter()
        .flat_map(|s| s["cloze_candidates"].as_array().unwrap())
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(candidates.contains(&"ACE inhibitors") || candidates.contains(&"Tobacco cessation"));
    assert_eq!(
        json["true_statements"]["from_key_points"].as_array().unwrap().len(),
        0
    );
    assert_eq!(json["validation_pass"], serde_json::Value::Bool(true));
}

#[test]
fn empty_key_points_skip_the_provider() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(dir.path(), "pmmcq24001", "A short critique sentence stands here.", &[]);

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "A short critique sentence stands here for testing.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["critique sentence"]}}"#.to_string(),
        ..StageResponses::default()
    };
    let provider = Arc::new(MockProvider::new(responses));
    let orchestrator = Orchestrator::with_parts(
        client_over(Box::new(common::SharedProvider(Arc::clone(&provider)))),
        PromptLibrary::default(),
        None,
        ValidatorRegistry::with_defaults(),
        QuestionStore::new(dir.path()),
        0.0,
        false,
    );

    let result = orchestrator
        .process("pmmcq24001", ProcessOptions::default())
        .unwrap();
    assert!(result.success);
    // Two calls total: critique extraction and cloze identification.
    assert_eq!(result.api_calls, 2);
    assert_eq!(
        provider
            .key_points_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert_eq!(
        provider.critique_calls.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[test]
fn negation_preservation() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "cvmcq24001",
        "Aspirin is not recommended for primary prevention in low-risk adults. \
         Statins reduce cardiovascular events in high-risk groups.",
        &[],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "Aspirin is not recommended for primary prevention in low-risk adults.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["Aspirin", "not recommended"]}}"#.to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, Some(medical_preprocessor()), false);

    let result = orchestrator
        .process("cvmcq24001", ProcessOptions::default())
        .unwrap();
    assert!(result.success);
    assert_eq!(result.validation_pass, Some(true));

    let json = read_question_json(dir.path(), "cvmcq24001");
    let statements = json["true_statements"]["from_critique"].as_array().unwrap();
    assert!(statements
        .iter()
        .any(|s| s["statement"].as_str().unwrap().contains("not recommended")));
    assert!(statements
        .iter()
        .all(|s| !s["statement"].as_str().unwrap().contains("Aspirin is recommended")));
    // The NLP summary recorded at least one negation in the critique.
    assert!(json["nlp_analysis"]["critique"]["negation_count"].as_u64().unwrap() >= 1);
}

#[test]
fn numeric_threshold_fidelity() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "cvmcq24002",
        "Hypertension is confirmed with repeated measurements in the office.",
        &["Blood pressure >140/90 mmHg defines hypertension."],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "Hypertension is confirmed with repeated office measurements.", "extra_field": null}
        ]}"#
        .to_string(),
        key_points: r#"{"statements": [
            {"statement": "Blood pressure >140/90 mmHg defines hypertension.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["repeated office measurements"], "2": [">140/90 mmHg", "hypertension"]}}"#
            .to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, Some(medical_preprocessor()), false);

    let result = orchestrator
        .process("cvmcq24002", ProcessOptions::default())
        .unwrap();
    assert!(result.success);
    assert_eq!(result.validation_pass, Some(true), "expected a passing verdict");

    let json = read_question_json(dir.path(), "cvmcq24002");
    let from_key_points = json["true_statements"]["from_key_points"].as_array().unwrap();
    assert!(from_key_points
        .iter()
        .any(|s| s["statement"].as_str().unwrap().contains(">140/90 mmHg")));
    let candidates: Vec<&str> = from_key_points
        .iter()
        .flat_map(|s| s["cloze_candidates"].as_array().unwrap())
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(candidates.contains(&">140/90 mmHg"));
    assert!(!candidates.contains(&"140"));
}

#[test]
fn consolidation_across_streams() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "npmcq24003",
        "First-line therapy for CKD-associated hypertension is an ACE inhibitor.",
        &["ACE inhibitors are first-line for hypertension in CKD."],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "First-line therapy for CKD-associated hypertension is an ACE inhibitor.", "extra_field": null}
        ]}"#
        .to_string(),
        key_points: r#"{"statements": [
            {"statement": "First-line therapy for CKD-associated hypertension is an ACE inhibitor", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["ACE inhibitor"], "2": ["First-line therapy"]}}"#
            .to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);

    let result = orchestrator
        .process("npmcq24003", ProcessOptions::default())
        .unwrap();
    assert!(result.success);
    assert_eq!(result.statements_extracted, 1, "duplicates must merge");

    let json = read_question_json(dir.path(), "npmcq24003");
    let from_critique = json["true_statements"]["from_critique"].as_array().unwrap();
    assert_eq!(from_critique.len(), 1);
    assert_eq!(
        json["true_statements"]["from_key_points"].as_array().unwrap().len(),
        0
    );
    let merged = &from_critique[0];
    assert_eq!(merged["provenance"], "critique");
    let candidates: Vec<&str> = merged["cloze_candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(candidates, ["ACE inhibitor", "First-line therapy"]);
}

#[test]
fn skip_when_already_augmented() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "gimcq24004",
        "Colonoscopy is the preferred screening test for colorectal cancer.",
        &[],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "Colonoscopy is the preferred screening test for colorectal cancer.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["Colonoscopy"]}}"#.to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);

    let first = orchestrator
        .process("gimcq24004", ProcessOptions::default())
        .unwrap();
    assert!(first.success);
    assert!(first.api_calls > 0);
    let after_first = std::fs::read_to_string(
        orchestrator.store().question_path("gimcq24004"),
    )
    .unwrap();

    // Second run without overwrite: no provider calls, file untouched.
    let second = orchestrator
        .process("gimcq24004", ProcessOptions::default())
        .unwrap();
    assert!(second.success);
    assert_eq!(second.statements_extracted, 0);
    assert_eq!(second.api_calls, 0);
    let after_second = std::fs::read_to_string(
        orchestrator.store().question_path("gimcq24004"),
    )
    .unwrap();
    assert_eq!(after_first, after_second);
}

#[test]
fn deterministic_rerun_with_overwrite_and_warm_cache() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "cvmcq24009",
        "Beta blockers reduce mortality after myocardial infarction in adults.",
        &[],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "Beta blockers reduce mortality after myocardial infarction.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["Beta blockers"]}}"#.to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);
    let overwrite = ProcessOptions {
        overwrite: true,
        dry_run: false,
    };

    let first = orchestrator.process("cvmcq24009", overwrite).unwrap();
    let after_first = read_question_json(dir.path(), "cvmcq24009");
    let second = orchestrator.process("cvmcq24009", overwrite).unwrap();
    let after_second = read_question_json(dir.path(), "cvmcq24009");

    assert!(first.api_calls > 0);
    // The second pass is fully served from the response cache.
    assert_eq!(second.api_calls, 0);
    assert_eq!(
        after_first["true_statements"], after_second["true_statements"],
        "re-run at temperature 0 with a warm cache must be deterministic"
    );
}

#[test]
fn non_destructive_augmentation() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "enmcq24005",
        "Metformin is first-line therapy for type 2 diabetes mellitus in adults.",
        &[],
    );
    let before = read_question_json(dir.path(), "enmcq24005");

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "Metformin is first-line therapy for type 2 diabetes mellitus.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["Metformin"]}}"#.to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);
    orchestrator
        .process("enmcq24005", ProcessOptions::default())
        .unwrap();

    let after = read_question_json(dir.path(), "enmcq24005");
    for (key, value) in before.as_object().unwrap() {
        assert_eq!(
            after.get(key),
            Some(value),
            "input key '{key}' must round-trip unchanged"
        );
    }
    assert!(after.get("true_statements").is_some());
    assert!(after.get("validation_pass").is_some());
}

#[test]
fn extraction_schema_error_fails_the_question_only() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(dir.path(), "cvmcq24006", "Some critique sentence goes here.", &[]);

    let responses = StageResponses {
        critique: r#"{"unexpected": []}"#.to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);

    let result = orchestrator
        .process("cvmcq24006", ProcessOptions::default())
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("critique_extraction"));

    // The question file was not modified.
    let json = read_question_json(dir.path(), "cvmcq24006");
    assert!(json.get("true_statements").is_none());
}

#[test]
fn hybrid_context_enhancement() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "cvmcq24007",
        "ACE inhibitors cause chronic cough. The mechanism involves accumulation of \
         bradykinin in the airway, which sensitizes cough receptors over weeks of therapy.",
        &[],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "ACE inhibitors cause chronic cough.", "extra_field": "Short note."}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["ACE inhibitors", "chronic cough"]}}"#.to_string(),
        context: r#"{"extra_field": "Bradykinin accumulation in the airway sensitizes cough receptors."}"#
            .to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, Some(medical_preprocessor()), true);

    let result = orchestrator
        .process("cvmcq24007", ProcessOptions::default())
        .unwrap();
    assert!(result.success);

    let json = read_question_json(dir.path(), "cvmcq24007");
    let statement = &json["true_statements"]["from_critique"][0];
    assert_eq!(statement["context_source"], "hybrid");
    assert_eq!(
        statement["extra_field"],
        statement["extra_field_enhanced"],
        "hybrid context must surface the enhanced text"
    );
}

#[test]
fn substring_property_holds_in_output() {
    let dir = tempfile::tempdir().unwrap();
    seed_question(
        dir.path(),
        "cvmcq24008",
        "A value less than 2 cm on imaging is reassuring for this lesion type.",
        &[],
    );

    let responses = StageResponses {
        critique: r#"{"statements": [
            {"statement": "A lesion measuring less than 2 cm on imaging is reassuring.", "extra_field": null}
        ]}"#
        .to_string(),
        cloze: r#"{"cloze_mapping": {"1": ["less than 2 cm"]}}"#.to_string(),
        ..StageResponses::default()
    };
    let orchestrator = orchestrator_with(dir.path(), responses, None, false);
    orchestrator
        .process("cvmcq24008", ProcessOptions::default())
        .unwrap();

    let json = read_question_json(dir.path(), "cvmcq24008");
    for stream in ["from_critique", "from_key_points"] {
        for statement in json["true_statements"][stream].as_array().unwrap() {
            let text = statement["statement"].as_str().unwrap();
            for candidate in statement["cloze_candidates"].as_array().unwrap() {
                assert!(
                    text.contains(candidate.as_str().unwrap()),
                    "candidate {candidate} not a substring of '{text}'"
                );
            }
        }
    }
    // The normalizer rewrote the spelled-out comparator in both the
    // statement and its candidate.
    let statement = &json["true_statements"]["from_critique"][0];
    assert!(statement["statement"].as_str().unwrap().contains("<2 cm"));
}
