//! Threshold rules: the routing gate after stage 1 and the final verdict bands.

use serde::{Deserialize, Serialize};

use screening_state::EvaluationStatus;

use crate::domain::ThresholdConfig;

/// Business outcome of a completed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Rejected,
    Selected,
    InConsideration,
}

impl Verdict {
    /// Terminal status the verdict maps to.
    pub fn status(&self) -> EvaluationStatus {
        match self {
            Self::Rejected => EvaluationStatus::Rejected,
            Self::Selected => EvaluationStatus::Selected,
            Self::InConsideration => EvaluationStatus::InConsideration,
        }
    }
}

/// Verdict plus the human-readable reason for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub message: String,
}

/// Band a composite score against `absolute_threshold +/- error_boundary`.
/// Both bounds belong to the consideration band.
pub fn verdict_for(score: f64, absolute_threshold: f64, error_boundary: f64) -> Verdict {
    let lower = absolute_threshold - error_boundary;
    let upper = absolute_threshold + error_boundary;
    if score < lower {
        Verdict::Rejected
    } else if score > upper {
        Verdict::Selected
    } else {
        Verdict::InConsideration
    }
}

/// Classify a composite score and explain the outcome.
pub fn classify(score: f64, thresholds: &ThresholdConfig) -> Decision {
    let verdict = verdict_for(score, thresholds.absolute_threshold, thresholds.error_boundary);
    let message = match verdict {
        Verdict::Rejected => format!(
            "Score {:.2} below threshold {:.2}",
            score,
            thresholds.lower_bound()
        ),
        Verdict::Selected => format!(
            "Score {:.2} above threshold {:.2}",
            score,
            thresholds.upper_bound()
        ),
        Verdict::InConsideration => format!("Score {:.2} within consideration range", score),
    };
    Decision { verdict, message }
}

/// Outcome of the routing gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoutingOutcome {
    Continue,
    Reject { message: String },
}

/// `jd_score < routing_threshold` rejects; equality continues.
pub fn route(jd_score: f64, routing_threshold: f64) -> RoutingOutcome {
    if jd_score < routing_threshold {
        RoutingOutcome::Reject {
            message: format!(
                "JD score {:.1} below threshold {:.1}",
                jd_score, routing_threshold
            ),
        }
    } else {
        RoutingOutcome::Continue
    }
}
