//! The evaluation record threaded through the stages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use screening_state::{
    ArtifactLocator, CandidateId, ContentDigest, EvaluationStatus, JobId, StatusKey,
    StatusUpdate,
};

use super::config::{ThresholdConfig, WeightConfig};
use super::error::{ErrorKind, StageError};
use crate::aggregate::{CompositeBreakdown, SubScores};
use crate::decision::RoutingOutcome;
use crate::stages::StageOutput;

/// Input documents, opaque to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInputs {
    pub resume: Value,
    pub job_description: Value,
    pub company_values: Value,
    pub uniqueness_definition: Value,
    pub custom_criteria: Value,
}

/// Where a stage artifact was written and what it hashed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub locator: ArtifactLocator,
    pub digest: ContentDigest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Justifications {
    pub jd_fit: Option<String>,
    pub cultural_fit: Option<String>,
    pub uniqueness: Option<String>,
}

/// State of one candidate/job evaluation.
///
/// Status and error fields are private: they only move through the
/// transition table in `EvaluationStatus::can_transition_to`. Once the
/// status is terminal the sequencer never touches the record again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub inputs: EvaluationInputs,
    pub weights: WeightConfig,
    pub thresholds: ThresholdConfig,

    pub jd_score: Option<f64>,
    pub cultural_fit_score: Option<f64>,
    pub uniqueness_score: Option<f64>,
    #[serde(default)]
    pub custom_criteria_scores: BTreeMap<String, f64>,
    pub composite_score: Option<f64>,
    pub breakdown: Option<CompositeBreakdown>,
    pub verdict_message: Option<String>,
    #[serde(default)]
    pub justifications: Justifications,
    pub jd_artifact: Option<ArtifactRef>,
    pub cultural_artifact: Option<ArtifactRef>,

    status: EvaluationStatus,
    error_kind: Option<ErrorKind>,
    error_message: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

impl EvaluationRecord {
    /// Fresh record in `INITIALIZED`.
    pub fn new(
        candidate_id: CandidateId,
        job_id: JobId,
        inputs: EvaluationInputs,
        weights: WeightConfig,
        thresholds: ThresholdConfig,
    ) -> Self {
        Self {
            candidate_id,
            job_id,
            inputs,
            weights,
            thresholds,
            jd_score: None,
            cultural_fit_score: None,
            uniqueness_score: None,
            custom_criteria_scores: BTreeMap::new(),
            composite_score: None,
            breakdown: None,
            verdict_message: None,
            justifications: Justifications::default(),
            jd_artifact: None,
            cultural_artifact: None,
            status: EvaluationStatus::Initialized,
            error_kind: None,
            error_message: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> EvaluationStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Set only when the status is `FAILED`.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn status_key(&self) -> StatusKey {
        StatusKey::new(self.candidate_id.clone(), self.job_id.clone())
    }

    pub fn sub_scores(&self) -> SubScores<'_> {
        SubScores {
            jd_score: self.jd_score,
            cultural_fit_score: self.cultural_fit_score,
            uniqueness_score: self.uniqueness_score,
            custom_criteria_scores: &self.custom_criteria_scores,
        }
    }

    /// Status-store image of this record. Written with `reset`, so nothing
    /// from an earlier run of the same key survives.
    pub(crate) fn status_snapshot(&self) -> StatusUpdate {
        let justifications = [
            ("jd_fit", &self.justifications.jd_fit),
            ("cultural_fit", &self.justifications.cultural_fit),
            ("uniqueness", &self.justifications.uniqueness),
        ]
        .into_iter()
        .filter_map(|(name, text)| Some((name.to_string(), text.clone()?)))
        .collect();
        let artifacts = [("jd_fit", &self.jd_artifact), ("cultural", &self.cultural_artifact)]
            .into_iter()
            .filter_map(|(name, artifact)| {
                Some((name.to_string(), artifact.as_ref()?.locator.clone()))
            })
            .collect();

        StatusUpdate {
            reset: true,
            status: Some(self.status),
            jd_score: self.jd_score,
            cultural_fit_score: self.cultural_fit_score,
            uniqueness_score: self.uniqueness_score,
            custom_criteria_scores: Some(self.custom_criteria_scores.clone()),
            composite_score: self.composite_score,
            verdict_message: self.verdict_message.clone(),
            justifications,
            artifacts,
            error_kind: self.error_kind.map(|kind| kind.as_str().to_string()),
            error_message: self.error_message.clone(),
        }
    }

    pub(crate) fn advance(&mut self, next: EvaluationStatus) -> Result<(), StageError> {
        if !self.status.can_transition_to(next) {
            return Err(StageError::Sequencing(format!(
                "illegal transition {} -> {}",
                self.status, next
            )));
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Move to `FAILED`, keeping everything earlier stages wrote.
    pub(crate) fn fail(&mut self, error: &StageError) {
        if self.is_terminal() {
            return;
        }
        self.status = EvaluationStatus::Failed;
        self.error_kind = Some(error.kind());
        self.error_message = Some(error.to_string());
        self.completed_at = Some(Utc::now());
    }

    /// Fold a successful stage output into the record. The status moves
    /// first, so an illegal transition leaves every field untouched.
    pub(crate) fn apply(&mut self, output: StageOutput) -> Result<(), StageError> {
        match output {
            StageOutput::JdFit {
                assessment,
                artifact,
            } => {
                self.advance(EvaluationStatus::Routing)?;
                self.jd_score = Some(assessment.jd_score);
                self.justifications.jd_fit = Some(assessment.justification);
                self.jd_artifact = Some(artifact);
            }
            StageOutput::Routed(RoutingOutcome::Continue) => {
                self.advance(EvaluationStatus::CulturalEvaluating)?;
            }
            StageOutput::Routed(RoutingOutcome::Reject { message }) => {
                self.advance(EvaluationStatus::Rejected)?;
                self.verdict_message = Some(message);
            }
            StageOutput::Cultural {
                assessment,
                artifact,
            } => {
                self.advance(EvaluationStatus::Aggregating)?;
                self.cultural_fit_score = Some(assessment.cultural_fit_score);
                self.uniqueness_score = Some(assessment.uniqueness_score);
                self.custom_criteria_scores = assessment.custom_criteria_scores;
                self.justifications.cultural_fit = Some(assessment.cultural_fit_justification);
                self.justifications.uniqueness = Some(assessment.uniqueness_justification);
                self.cultural_artifact = Some(artifact);
            }
            StageOutput::Aggregated {
                breakdown,
                decision,
            } => {
                self.advance(decision.verdict.status())?;
                self.composite_score = Some(breakdown.composite);
                self.breakdown = Some(breakdown);
                self.verdict_message = Some(decision.message);
            }
        }
        Ok(())
    }
}
