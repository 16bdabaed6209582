use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use screening_state::{
    ArtifactLocator, EvaluationStatus, StagePersistence, StatusStore, StatusUpdate,
};

use super::{write_marker, Stage, StageOutput, StageStep, StageToken};
use crate::domain::{ArtifactRef, EvaluationRecord, StageError};
use crate::oracle::{AssessmentOracle, AssessmentRequest, Capability, JdFitAssessment};

pub const JD_ANALYSIS_FILE: &str = "jd_analysis.json";

const SCORING_RUBRIC: [(&str, u32); 5] = [
    ("Required Skills Match", 35),
    ("Preferred Skills Match", 20),
    ("Experience Match", 20),
    ("Education Match", 10),
    ("Resume Quality & Strengths", 15),
];

/// Point allocation the oracle is asked to grade the resume against.
pub fn scoring_rubric() -> Value {
    let rubric: serde_json::Map<String, Value> = SCORING_RUBRIC
        .iter()
        .map(|(name, points)| ((*name).to_string(), json!(points)))
        .collect();
    Value::Object(rubric)
}

/// Stage 1: job-description fit.
pub struct JdFitStage {
    oracle: Arc<dyn AssessmentOracle>,
    persistence: Arc<dyn StagePersistence>,
    status: Arc<dyn StatusStore>,
}

impl JdFitStage {
    pub fn new(
        oracle: Arc<dyn AssessmentOracle>,
        persistence: Arc<dyn StagePersistence>,
        status: Arc<dyn StatusStore>,
    ) -> Self {
        Self {
            oracle,
            persistence,
            status,
        }
    }

    fn request(record: &EvaluationRecord) -> AssessmentRequest {
        AssessmentRequest {
            candidate_id: record.candidate_id.clone(),
            job_id: record.job_id.clone(),
            payload: json!({
                "resume": record.inputs.resume,
                "job_description": record.inputs.job_description,
                "scoring_rubric": scoring_rubric(),
            }),
        }
    }
}

#[async_trait]
impl Stage for JdFitStage {
    fn token(&self) -> StageToken {
        StageToken::JdEvaluation
    }

    async fn run(&self, record: &EvaluationRecord) -> Result<StageStep, StageError> {
        let key = record.status_key();
        write_marker(
            self.status.as_ref(),
            &key,
            StatusUpdate::restart(EvaluationStatus::JdEvaluating),
        )
        .await?;

        let response = self
            .oracle
            .evaluate(&Self::request(record), Capability::JdFit)
            .await
            .map_err(|source| StageError::Oracle {
                capability: Capability::JdFit.as_str(),
                source,
            })?;
        let assessment = JdFitAssessment::parse(response)?;

        let locator = ArtifactLocator::analysis(&record.job_id, &record.candidate_id, JD_ANALYSIS_FILE);
        let digest = self
            .persistence
            .put(&locator, &assessment.document)
            .await
            .map_err(StageError::persistence("storing jd analysis"))?;

        write_marker(
            self.status.as_ref(),
            &key,
            StatusUpdate {
                status: Some(EvaluationStatus::Routing),
                jd_score: Some(assessment.jd_score),
                justifications: BTreeMap::from([(
                    "jd_fit".to_string(),
                    assessment.justification.clone(),
                )]),
                artifacts: BTreeMap::from([("jd_fit".to_string(), locator.clone())]),
                ..StatusUpdate::default()
            },
        )
        .await?;

        Ok(StageStep {
            output: StageOutput::JdFit {
                assessment,
                artifact: ArtifactRef { locator, digest },
            },
            next: StageToken::Routing,
        })
    }
}
