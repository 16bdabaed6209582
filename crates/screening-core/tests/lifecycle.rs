//! Idempotence, resumption, concurrent runs and intake.

mod common;

use std::sync::Arc;

use common::*;
use screening_core::{
    CandidateId, Capability, ContentDigest, ErrorKind, EvaluationRequest, EvaluationStatus,
    InputLocators, JobId, ScreeningSettings, StageSequencer, StatusKey, JD_ANALYSIS_FILE,
};
use screening_state::fakes::{MemoryDocumentSource, MemoryStatusStore};
use screening_state::{FsStagePersistence, StatusStore};
use serde_json::json;
use tokio::task::JoinSet;
use tokio::time::Duration;

fn deterministic_oracle() -> ScriptedOracle {
    ScriptedOracle::answering(
        jd_response(8.0),
        cultural_response(7.0, 6.0, &[("A", 9.0), ("B", 5.0)]),
    )
}

// ===========================================================================
// Idempotence and resumption
// ===========================================================================

#[tokio::test]
async fn rerunning_the_initial_record_gives_the_same_outcome() {
    let h = Harness::new(deterministic_oracle());
    let initial = record("cand-1");

    let first = h.sequencer.run(initial.clone()).await.unwrap();
    let second = h.sequencer.run(initial).await.unwrap();

    assert_eq!(first.status(), second.status());
    assert_eq!(first.composite_score, second.composite_score);
    assert_eq!(first.breakdown, second.breakdown);
    assert_eq!(first.jd_artifact, second.jd_artifact);
}

#[tokio::test]
async fn separate_pipelines_agree() {
    let a = Harness::new(deterministic_oracle());
    let b = Harness::new(deterministic_oracle());

    let out_a = a.sequencer.run(record("cand-2")).await.unwrap();
    let out_b = b.sequencer.run(record("cand-2")).await.unwrap();

    assert_eq!(out_a.status(), out_b.status());
    assert_eq!(out_a.composite_score, out_b.composite_score);
}

#[tokio::test]
async fn terminal_record_is_returned_unchanged() {
    let h = Harness::new(deterministic_oracle());
    let done = h.sequencer.run(record("cand-3")).await.unwrap();
    let calls_before = h.oracle.calls(Capability::JdFit);

    let again = h.sequencer.run(done.clone()).await.unwrap();

    assert_eq!(again, done);
    assert_eq!(h.oracle.calls(Capability::JdFit), calls_before);
}

#[tokio::test]
async fn failed_record_is_not_retried() {
    let h = Harness::new(ScriptedOracle::new().on(Capability::JdFit, vec![Step::Err("down")]));
    let failed = h.sequencer.run(record("cand-4")).await.unwrap();
    assert_eq!(failed.status(), EvaluationStatus::Failed);

    let again = h.sequencer.run(failed.clone()).await.unwrap();

    assert_eq!(again, failed);
    assert_eq!(h.oracle.calls(Capability::JdFit), 1);
}

#[tokio::test]
async fn resumes_from_cultural_evaluation() {
    let h = Harness::new(deterministic_oracle());
    let resumed = restored_at(
        record("cand-5"),
        "CULTURAL_EVALUATING",
        json!({"jd_score": 8.0}),
    );

    let out = h.sequencer.run(resumed).await.unwrap();

    assert_eq!(h.oracle.calls(Capability::JdFit), 0);
    assert_eq!(h.oracle.calls(Capability::CulturalUniquenessCustom), 1);
    assert_eq!(out.composite_score, Some(71.0));
    assert_eq!(out.status(), EvaluationStatus::InConsideration);
}

#[tokio::test]
async fn resumes_an_interrupted_jd_evaluation() {
    let h = Harness::new(deterministic_oracle());
    let resumed = restored_at(record("cand-6"), "JD_EVALUATING", json!({}));

    let out = h.sequencer.run(resumed).await.unwrap();

    assert_eq!(h.oracle.calls(Capability::JdFit), 1);
    assert!(out.is_terminal());
    assert_ne!(out.status(), EvaluationStatus::Failed);
}

// ===========================================================================
// Status store across reruns
// ===========================================================================

fn cultural_script(steps: Vec<Step>) -> ScriptedOracle {
    ScriptedOracle::new()
        .on(Capability::JdFit, vec![Step::Return(jd_response(8.5))])
        .on(Capability::CulturalUniquenessCustom, steps)
}

fn strong_cultural() -> Step {
    Step::Return(cultural_response(8.5, 8.5, &[("A", 8.5), ("B", 8.5)]))
}

#[tokio::test]
async fn success_after_failure_clears_the_stored_error() {
    let h = Harness::new(cultural_script(vec![Step::Err("down"), strong_cultural()]));
    let key = StatusKey::new(CandidateId::new("cand-r1"), JobId::new("job-1"));

    let first = h.sequencer.run(record("cand-r1")).await.unwrap();
    assert_eq!(first.status(), EvaluationStatus::Failed);
    assert_eq!(
        h.status.get(&key).await.unwrap().error_kind.as_deref(),
        Some("oracle")
    );

    let second = h.sequencer.run(record("cand-r1")).await.unwrap();
    assert_eq!(second.status(), EvaluationStatus::Selected);

    let stored = h.status.get(&key).await.unwrap();
    assert_eq!(stored.status, EvaluationStatus::Selected);
    assert_eq!(stored.composite_score, Some(85.0));
    assert!(stored.error_kind.is_none());
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn failure_after_success_drops_the_stored_verdict() {
    let h = Harness::new(cultural_script(vec![strong_cultural(), Step::Err("down")]));
    let key = StatusKey::new(CandidateId::new("cand-r2"), JobId::new("job-1"));

    let first = h.sequencer.run(record("cand-r2")).await.unwrap();
    assert_eq!(first.status(), EvaluationStatus::Selected);

    let second = h.sequencer.run(record("cand-r2")).await.unwrap();
    assert_eq!(second.status(), EvaluationStatus::Failed);

    let stored = h.status.get(&key).await.unwrap();
    assert_eq!(stored.status, EvaluationStatus::Failed);
    assert_eq!(stored.error_kind.as_deref(), Some("oracle"));
    assert!(stored.composite_score.is_none());
    assert!(stored.verdict_message.is_none());
    assert!(stored.cultural_fit_score.is_none());
    assert!(!stored.artifacts.contains_key("cultural"));
    assert_eq!(stored.jd_score, Some(8.5));
    assert!(stored.artifacts.contains_key("jd_fit"));
}

#[tokio::test]
async fn intake_failure_after_success_drops_the_stored_verdict() {
    let h = Harness::new(deterministic_oracle());
    let key = StatusKey::new(CandidateId::new("cand-r3"), JobId::new("job-1"));

    let first = h.sequencer.evaluate(&documents(), request("cand-r3")).await.unwrap();
    assert_eq!(first.composite_score, Some(71.0));

    let source = documents().with_failure("resumes/ada.json");
    let second = h.sequencer.evaluate(&source, request("cand-r3")).await.unwrap();
    assert_eq!(second.status(), EvaluationStatus::Failed);

    let stored = h.status.get(&key).await.unwrap();
    assert_eq!(stored.status, EvaluationStatus::Failed);
    assert_eq!(stored.error_kind.as_deref(), Some("input_fetch"));
    assert!(stored.jd_score.is_none());
    assert!(stored.composite_score.is_none());
    assert!(stored.verdict_message.is_none());
    assert!(stored.artifacts.is_empty());
}

// ===========================================================================
// Concurrency
// ===========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_sequencer_drives_many_records_concurrently() {
    let h = Harness::new(deterministic_oracle());
    let sequencer = Arc::new(h.sequencer);

    let mut set = JoinSet::new();
    for i in 0..16 {
        let sequencer = sequencer.clone();
        set.spawn(async move { sequencer.run(record(&format!("cand-{i}"))).await });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = set.join_next().await {
        outcomes.push(joined.unwrap().unwrap());
    }

    assert_eq!(outcomes.len(), 16);
    assert!(outcomes
        .iter()
        .all(|r| r.status() == EvaluationStatus::InConsideration && r.composite_score == Some(71.0)));
    assert_eq!(h.oracle.calls(Capability::JdFit), 16);
    assert_eq!(sequencer.metrics().evaluations_started(), 16);
    assert_eq!(sequencer.metrics().in_consideration(), 16);

    for i in 0..16 {
        let key = StatusKey::new(CandidateId::new(format!("cand-{i}")), JobId::new("job-1"));
        let stored = h.status.get(&key).await.unwrap();
        assert_eq!(stored.status, EvaluationStatus::InConsideration);
    }
}

// ===========================================================================
// Intake
// ===========================================================================

fn locators() -> InputLocators {
    InputLocators {
        resume: "resumes/ada.json".into(),
        job_description: "jobs/backend.json".into(),
        company_values: "company/values.json".into(),
        uniqueness_definition: "company/uniqueness.json".into(),
        custom_criteria: "jobs/backend-criteria.json".into(),
    }
}

fn documents() -> MemoryDocumentSource {
    let docs = inputs();
    MemoryDocumentSource::new()
        .with_document("resumes/ada.json", docs.resume)
        .with_document("jobs/backend.json", docs.job_description)
        .with_document("company/values.json", docs.company_values)
        .with_document("company/uniqueness.json", docs.uniqueness_definition)
        .with_document("jobs/backend-criteria.json", docs.custom_criteria)
}

fn request(candidate: &str) -> EvaluationRequest {
    EvaluationRequest {
        candidate_id: CandidateId::new(candidate),
        job_id: JobId::new("job-1"),
        inputs: locators(),
        weights: Some(reference_weights()),
        thresholds: Some(reference_thresholds()),
    }
}

#[tokio::test]
async fn evaluate_fetches_inputs_then_runs() {
    let h = Harness::new(deterministic_oracle());
    let source = documents();

    let out = h.sequencer.evaluate(&source, request("cand-7")).await.unwrap();

    assert_eq!(source.fetch_count(), 5);
    assert_eq!(out.inputs, inputs());
    assert_eq!(out.composite_score, Some(71.0));
    let requests = h.oracle.requests().await;
    assert_eq!(requests[0].1.payload["job_description"]["title"], "Backend Engineer");
}

#[tokio::test]
async fn evaluate_uses_settings_defaults_when_request_has_none() {
    let h = Harness::new(deterministic_oracle());
    let mut req = request("cand-8");
    req.weights = None;
    req.thresholds = None;

    let out = h.sequencer.evaluate(&documents(), req).await.unwrap();

    assert_eq!(&out.weights, &h.sequencer.settings().weights);
    assert_eq!(out.thresholds.routing_threshold, 7.0);
    assert!(out.is_terminal());
}

#[tokio::test]
async fn fetch_failure_yields_failed_record() {
    let h = Harness::new(deterministic_oracle());
    let source = documents().with_failure("company/values.json");

    let out = h.sequencer.evaluate(&source, request("cand-9")).await.unwrap();

    assert_eq!(out.status(), EvaluationStatus::Failed);
    assert_eq!(out.error_kind(), Some(ErrorKind::InputFetch));
    assert!(out.error_message().unwrap().contains("company_values"));
    assert_eq!(h.oracle.calls(Capability::JdFit), 0);

    let key = StatusKey::new(CandidateId::new("cand-9"), JobId::new("job-1"));
    assert_eq!(
        h.status.get(&key).await.unwrap().error_kind.as_deref(),
        Some("input_fetch")
    );
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_fails_with_timeout() {
    let settings = ScreeningSettings {
        fetch_timeout_ms: 2_000,
        ..ScreeningSettings::default()
    };
    let h = Harness::with_settings(deterministic_oracle(), settings);
    let source = documents().with_delay("resumes/ada.json", Duration::from_secs(30));

    let out = h.sequencer.evaluate(&source, request("cand-10")).await.unwrap();

    assert_eq!(out.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(h.oracle.calls(Capability::JdFit), 0);
}

#[tokio::test]
async fn evaluate_rejects_bad_request_config() {
    let h = Harness::new(deterministic_oracle());
    let mut req = request("cand-11");
    req.thresholds = Some(screening_core::ThresholdConfig::new(12.0, 70.0, 10.0));

    assert!(h.sequencer.evaluate(&documents(), req).await.is_err());
}

// ===========================================================================
// Filesystem artifacts
// ===========================================================================

#[tokio::test]
async fn filesystem_store_receives_analysis_documents() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FsStagePersistence::new(dir.path()).unwrap());
    let status = Arc::new(MemoryStatusStore::new());
    let sequencer = StageSequencer::new(
        Arc::new(deterministic_oracle()),
        persistence,
        status,
        ScreeningSettings::default(),
    )
    .unwrap();

    let out = sequencer.run(record("cand-12")).await.unwrap();

    let path = dir.path().join("job-1").join("cand-12").join(JD_ANALYSIS_FILE);
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(
        out.jd_artifact.unwrap().digest,
        ContentDigest::from_bytes(&bytes)
    );
    assert!(dir
        .path()
        .join("job-1/cand-12/cultural_analysis.json")
        .is_file());
}
