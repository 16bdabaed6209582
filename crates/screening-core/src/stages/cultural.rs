use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use screening_state::{
    ArtifactLocator, EvaluationStatus, StagePersistence, StatusStore, StatusUpdate,
};

use super::{write_marker, Stage, StageOutput, StageStep, StageToken};
use crate::domain::{ArtifactRef, EvaluationRecord, StageError};
use crate::oracle::{AssessmentOracle, AssessmentRequest, Capability, CulturalAssessment};

pub const CULTURAL_ANALYSIS_FILE: &str = "cultural_analysis.json";

/// Stage 2: cultural fit, uniqueness and custom criteria in one oracle call.
pub struct CulturalStage {
    oracle: Arc<dyn AssessmentOracle>,
    persistence: Arc<dyn StagePersistence>,
    status: Arc<dyn StatusStore>,
}

impl CulturalStage {
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
                "company_values": record.inputs.company_values,
                "uniqueness_definition": record.inputs.uniqueness_definition,
                "custom_criteria": record.inputs.custom_criteria,
            }),
        }
    }
}

#[async_trait]
impl Stage for CulturalStage {
    fn token(&self) -> StageToken {
        StageToken::CulturalEvaluation
    }

    async fn run(&self, record: &EvaluationRecord) -> Result<StageStep, StageError> {
        let capability = Capability::CulturalUniquenessCustom;
        let response = self
            .oracle
            .evaluate(&Self::request(record), capability)
            .await
            .map_err(|source| StageError::Oracle {
                capability: capability.as_str(),
                source,
            })?;
        let assessment = CulturalAssessment::parse(response)?;

        let locator = ArtifactLocator::analysis(
            &record.job_id,
            &record.candidate_id,
            CULTURAL_ANALYSIS_FILE,
        );
        let digest = self
            .persistence
            .put(&locator, &assessment.document)
            .await
            .map_err(StageError::persistence("storing cultural analysis"))?;

        write_marker(
            self.status.as_ref(),
            &record.status_key(),
            StatusUpdate {
                status: Some(EvaluationStatus::Aggregating),
                cultural_fit_score: Some(assessment.cultural_fit_score),
                uniqueness_score: Some(assessment.uniqueness_score),
                custom_criteria_scores: Some(assessment.custom_criteria_scores.clone()),
                justifications: BTreeMap::from([
                    (
                        "cultural_fit".to_string(),
                        assessment.cultural_fit_justification.clone(),
                    ),
                    (
                        "uniqueness".to_string(),
                        assessment.uniqueness_justification.clone(),
                    ),
                ]),
                artifacts: BTreeMap::from([("cultural".to_string(), locator.clone())]),
                ..StatusUpdate::default()
            },
        )
        .await?;

        Ok(StageStep {
            output: StageOutput::Cultural {
                assessment,
                artifact: ArtifactRef { locator, digest },
            },
            next: StageToken::Aggregation,
        })
    }
}
