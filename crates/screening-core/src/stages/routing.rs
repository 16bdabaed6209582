use std::sync::Arc;

use async_trait::async_trait;

use screening_state::{EvaluationStatus, StatusStore, StatusUpdate};

use super::{write_marker, Stage, StageOutput, StageStep, StageToken};
use crate::decision::{route, RoutingOutcome};
use crate::domain::{EvaluationRecord, StageError};

/// Gate between the two assessments: a weak job fit ends the evaluation
/// before the second oracle call.
pub struct RoutingStage {
    status: Arc<dyn StatusStore>,
}

impl RoutingStage {
    pub fn new(status: Arc<dyn StatusStore>) -> Self {
        Self { status }
    }
}

#[async_trait]
impl Stage for RoutingStage {
    fn token(&self) -> StageToken {
        StageToken::Routing
    }

    async fn run(&self, record: &EvaluationRecord) -> Result<StageStep, StageError> {
        let jd_score = record.jd_score.ok_or_else(|| {
            StageError::Sequencing("routing reached without a jd_score".to_string())
        })?;

        let outcome = route(jd_score, record.thresholds.routing_threshold);
        let (update, next) = match &outcome {
            RoutingOutcome::Continue => (
                StatusUpdate::status(EvaluationStatus::CulturalEvaluating),
                StageToken::CulturalEvaluation,
            ),
            RoutingOutcome::Reject { message } => (
                StatusUpdate {
                    status: Some(EvaluationStatus::Rejected),
                    verdict_message: Some(message.clone()),
                    ..StatusUpdate::default()
                },
                StageToken::End,
            ),
        };
        write_marker(self.status.as_ref(), &record.status_key(), update).await?;

        Ok(StageStep {
            output: StageOutput::Routed(outcome),
            next,
        })
    }
}
