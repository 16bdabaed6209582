//! Pipeline stages and the fixed topology that links them.
//!
//! ```text
//! JdEvaluation -> Routing -> CulturalEvaluation -> Aggregation -> End
//!                    \-> End (rejected)
//! ```
//!
//! A stage reads the record, talks to its adapters and returns a typed
//! output plus the token of the next stage. It never mutates the record;
//! the sequencer folds the output in only after the stage succeeded.

mod aggregation;
mod cultural;
mod jd_fit;
mod routing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use screening_state::{EvaluationStatus, StatusKey, StatusStore, StatusUpdate};

use crate::aggregate::CompositeBreakdown;
use crate::decision::{Decision, RoutingOutcome};
use crate::domain::{ArtifactRef, EvaluationRecord, StageError};
use crate::oracle::{CulturalAssessment, JdFitAssessment};

pub use aggregation::AggregationStage;
pub use cultural::{CulturalStage, CULTURAL_ANALYSIS_FILE};
pub use jd_fit::{scoring_rubric, JdFitStage, JD_ANALYSIS_FILE};
pub use routing::RoutingStage;

/// Names a node in the stage topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageToken {
    JdEvaluation,
    Routing,
    CulturalEvaluation,
    Aggregation,
    End,
}

impl StageToken {
    /// Number of runnable stages; no run visits more.
    pub const TOPOLOGY_LEN: usize = 4;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JdEvaluation => "jd_evaluation",
            Self::Routing => "routing",
            Self::CulturalEvaluation => "cultural_evaluation",
            Self::Aggregation => "aggregation",
            Self::End => "end",
        }
    }

    /// Status the record holds while this stage runs.
    pub fn entry_status(&self) -> Option<EvaluationStatus> {
        match self {
            Self::JdEvaluation => Some(EvaluationStatus::JdEvaluating),
            Self::Routing => Some(EvaluationStatus::Routing),
            Self::CulturalEvaluation => Some(EvaluationStatus::CulturalEvaluating),
            Self::Aggregation => Some(EvaluationStatus::Aggregating),
            Self::End => None,
        }
    }

    /// Stage to run for a record in `status`. `None` for terminal records.
    pub fn resume_point(status: EvaluationStatus) -> Option<StageToken> {
        match status {
            EvaluationStatus::Initialized | EvaluationStatus::JdEvaluating => {
                Some(Self::JdEvaluation)
            }
            EvaluationStatus::Routing => Some(Self::Routing),
            EvaluationStatus::CulturalEvaluating => Some(Self::CulturalEvaluation),
            EvaluationStatus::Aggregating => Some(Self::Aggregation),
            EvaluationStatus::Rejected
            | EvaluationStatus::Selected
            | EvaluationStatus::InConsideration
            | EvaluationStatus::Failed => None,
        }
    }
}

impl std::fmt::Display for StageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed result of one successful stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    JdFit {
        assessment: JdFitAssessment,
        artifact: ArtifactRef,
    },
    Routed(RoutingOutcome),
    Cultural {
        assessment: CulturalAssessment,
        artifact: ArtifactRef,
    },
    Aggregated {
        breakdown: CompositeBreakdown,
        decision: Decision,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageStep {
    pub output: StageOutput,
    pub next: StageToken,
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn token(&self) -> StageToken;

    async fn run(&self, record: &EvaluationRecord) -> Result<StageStep, StageError>;
}

async fn write_marker(
    status: &dyn StatusStore,
    key: &StatusKey,
    update: StatusUpdate,
) -> Result<(), StageError> {
    status
        .update(key, update)
        .await
        .map_err(StageError::persistence("writing status marker"))
}
