use std::sync::Arc;

use async_trait::async_trait;

use screening_state::{StatusStore, StatusUpdate};

use super::{write_marker, Stage, StageOutput, StageStep, StageToken};
use crate::aggregate::aggregate;
use crate::decision::classify;
use crate::domain::{EvaluationRecord, StageError};
use crate::obs;

/// Final stage: composite score and verdict.
pub struct AggregationStage {
    status: Arc<dyn StatusStore>,
}

impl AggregationStage {
    pub fn new(status: Arc<dyn StatusStore>) -> Self {
        Self { status }
    }
}

#[async_trait]
impl Stage for AggregationStage {
    fn token(&self) -> StageToken {
        StageToken::Aggregation
    }

    async fn run(&self, record: &EvaluationRecord) -> Result<StageStep, StageError> {
        let breakdown = aggregate(&record.sub_scores(), &record.weights)?;
        for criterion in &breakdown.ignored_criteria {
            obs::emit_unweighted_criterion(&record.status_key(), criterion);
        }

        let decision = classify(breakdown.composite, &record.thresholds);
        write_marker(
            self.status.as_ref(),
            &record.status_key(),
            StatusUpdate {
                status: Some(decision.verdict.status()),
                composite_score: Some(breakdown.composite),
                verdict_message: Some(decision.message.clone()),
                ..StatusUpdate::default()
            },
        )
        .await?;

        Ok(StageStep {
            output: StageOutput::Aggregated {
                breakdown,
                decision,
            },
            next: StageToken::End,
        })
    }
}
