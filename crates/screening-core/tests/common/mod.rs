//! Shared fixtures for the screening-core integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use screening_core::{
    AssessmentOracle, AssessmentRequest, CandidateId, Capability, EvaluationInputs,
    EvaluationRecord, JobId, OracleError, ScreeningSettings, StageSequencer, ThresholdConfig,
    WeightConfig,
};
use screening_state::fakes::{MemoryStagePersistence, MemoryStatusStore};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

#[derive(Clone)]
pub enum Step {
    Return(Value),
    Err(&'static str),
    /// Sleep, then return the value.
    Sleep(u64, Value),
}

/// Oracle stub answering from a per-capability script. The last step of a
/// script repeats, so a single-step script is a deterministic oracle.
#[derive(Default)]
pub struct ScriptedOracle {
    scripts: Mutex<HashMap<Capability, Vec<Step>>>,
    requests: Mutex<Vec<(Capability, AssessmentRequest)>>,
    jd_calls: AtomicUsize,
    cultural_calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, capability: Capability, steps: Vec<Step>) -> Self {
        self.scripts.try_lock().unwrap().insert(capability, steps);
        self
    }

    /// Deterministic oracle answering both capabilities.
    pub fn answering(jd: Value, cultural: Value) -> Self {
        Self::new()
            .on(Capability::JdFit, vec![Step::Return(jd)])
            .on(Capability::CulturalUniquenessCustom, vec![Step::Return(cultural)])
    }

    pub fn calls(&self, capability: Capability) -> usize {
        match capability {
            Capability::JdFit => self.jd_calls.load(Ordering::SeqCst),
            Capability::CulturalUniquenessCustom => self.cultural_calls.load(Ordering::SeqCst),
        }
    }

    pub async fn requests(&self) -> Vec<(Capability, AssessmentRequest)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl AssessmentOracle for ScriptedOracle {
    async fn evaluate(
        &self,
        request: &AssessmentRequest,
        capability: Capability,
    ) -> Result<Value, OracleError> {
        match capability {
            Capability::JdFit => self.jd_calls.fetch_add(1, Ordering::SeqCst),
            Capability::CulturalUniquenessCustom => {
                self.cultural_calls.fetch_add(1, Ordering::SeqCst)
            }
        };
        self.requests
            .lock()
            .await
            .push((capability, request.clone()));

        let step = {
            let mut scripts = self.scripts.lock().await;
            match scripts.get_mut(&capability) {
                Some(steps) if steps.len() > 1 => steps.remove(0),
                Some(steps) if steps.len() == 1 => steps[0].clone(),
                _ => Step::Err("no scripted step"),
            }
        };

        match step {
            Step::Return(v) => Ok(v),
            Step::Err(msg) => Err(OracleError::Unavailable(msg.to_string())),
            Step::Sleep(ms, v) => {
                sleep(Duration::from_millis(ms)).await;
                Ok(v)
            }
        }
    }
}

pub fn jd_response(score: f64) -> Value {
    json!({
        "jd_score": score,
        "justification": format!("job fit scored {score}"),
        "strengths": ["systems programming"],
        "improvements": [],
    })
}

pub fn cultural_response(cultural: f64, uniqueness: f64, custom: &[(&str, f64)]) -> Value {
    let custom: Vec<Value> = custom
        .iter()
        .map(|(name, score)| json!({"name": name, "score": score}))
        .collect();
    json!({
        "cultural_fit_score": cultural,
        "cultural_fit_justification": "shares the team's values",
        "core_value_scores": {"ownership": cultural},
        "uniqueness_score": uniqueness,
        "uniqueness_justification": "unusual career path",
        "custom_criteria_scores": custom,
    })
}

/// `jd=4, cultural=2, uniqueness=3, custom={A: 0.5, B: 0.5}`
pub fn reference_weights() -> WeightConfig {
    WeightConfig::base(4.0, 2.0, 3.0)
        .with_custom("A", 0.5)
        .with_custom("B", 0.5)
}

/// Routing at 6.0, decision bands 60..=80.
pub fn reference_thresholds() -> ThresholdConfig {
    ThresholdConfig::new(6.0, 70.0, 10.0)
}

pub fn inputs() -> EvaluationInputs {
    EvaluationInputs {
        resume: json!({"name": "Ada", "skills": ["rust", "tokio"]}),
        job_description: json!({"title": "Backend Engineer", "required": ["rust"]}),
        company_values: json!(["ownership", "candour"]),
        uniqueness_definition: json!({"definition": "rare combination of skills"}),
        custom_criteria: json!([{"name": "A"}, {"name": "B"}]),
    }
}

pub fn record(candidate: &str) -> EvaluationRecord {
    EvaluationRecord::new(
        CandidateId::new(candidate),
        JobId::new("job-1"),
        inputs(),
        reference_weights(),
        reference_thresholds(),
    )
}

/// Rebuild `record` as if it had been persisted mid-flight at `status`.
pub fn restored_at(record: EvaluationRecord, status: &str, patch: Value) -> EvaluationRecord {
    let mut json = serde_json::to_value(record).unwrap();
    json["status"] = json!(status);
    if let Value::Object(fields) = patch {
        for (k, v) in fields {
            json[k.as_str()] = v;
        }
    }
    serde_json::from_value(json).unwrap()
}

pub struct Harness {
    pub oracle: Arc<ScriptedOracle>,
    pub persistence: Arc<MemoryStagePersistence>,
    pub status: Arc<MemoryStatusStore>,
    pub sequencer: StageSequencer,
}

impl Harness {
    pub fn new(oracle: ScriptedOracle) -> Self {
        Self::with_settings(oracle, ScreeningSettings::default())
    }

    pub fn with_settings(oracle: ScriptedOracle, settings: ScreeningSettings) -> Self {
        let oracle = Arc::new(oracle);
        let persistence = Arc::new(MemoryStagePersistence::new());
        let status = Arc::new(MemoryStatusStore::new());
        let sequencer = StageSequencer::new(
            oracle.clone(),
            persistence.clone(),
            status.clone(),
            settings,
        )
        .expect("valid settings");
        Self {
            oracle,
            persistence,
            status,
            sequencer,
        }
    }
}
