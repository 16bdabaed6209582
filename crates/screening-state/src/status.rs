//! Lifecycle status of a candidate evaluation.

use serde::{Deserialize, Serialize};

/// Position of an evaluation in the stage topology.
///
/// Persisted as `SCREAMING_SNAKE_CASE` strings (`"JD_EVALUATING"`), which is
/// also how the status store reports progress to outside readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    #[default]
    Initialized,
    JdEvaluating,
    Routing,
    CulturalEvaluating,
    Aggregating,
    Rejected,
    Selected,
    InConsideration,
    Failed,
}

impl EvaluationStatus {
    /// All states in topology order.
    pub const ALL: [EvaluationStatus; 9] = [
        Self::Initialized,
        Self::JdEvaluating,
        Self::Routing,
        Self::CulturalEvaluating,
        Self::Aggregating,
        Self::Rejected,
        Self::Selected,
        Self::InConsideration,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "INITIALIZED",
            Self::JdEvaluating => "JD_EVALUATING",
            Self::Routing => "ROUTING",
            Self::CulturalEvaluating => "CULTURAL_EVALUATING",
            Self::Aggregating => "AGGREGATING",
            Self::Rejected => "REJECTED",
            Self::Selected => "SELECTED",
            Self::InConsideration => "IN_CONSIDERATION",
            Self::Failed => "FAILED",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Selected | Self::InConsideration | Self::Failed
        )
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// `FAILED` is reachable from every non-terminal state.
    pub fn can_transition_to(&self, next: EvaluationStatus) -> bool {
        use EvaluationStatus::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Initialized, JdEvaluating)
                | (JdEvaluating, Routing)
                | (Routing, CulturalEvaluating)
                | (Routing, Rejected)
                | (CulturalEvaluating, Aggregating)
                | (Aggregating, Rejected)
                | (Aggregating, Selected)
                | (Aggregating, InConsideration)
        )
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
