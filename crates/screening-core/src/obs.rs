//! Structured observability hooks for the evaluation lifecycle.
//!
//! This module provides:
//! - an evaluation-scoped tracing span (`evaluation_span`)
//! - emission functions for lifecycle events: start, stage start/finish/failure, finish
//!
//! Events are emitted at `info!` level, failures at `warn!`. For JSON output,
//! set `SCREENING_LOG_FORMAT=json` (see `telemetry`).

use screening_state::{EvaluationStatus, StatusKey};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ErrorKind;
use crate::stages::StageToken;

/// Span tagging every event of one evaluation run.
///
/// Attach with `tracing::Instrument::instrument` so it follows the future
/// across await points.
pub fn evaluation_span(key: &StatusKey, trace_id: Uuid) -> tracing::Span {
    tracing::info_span!(
        "screening.evaluation",
        candidate_id = %key.candidate_id,
        job_id = %key.job_id,
        trace_id = %trace_id,
    )
}

/// Emit event: evaluation started (or resumed) from `status`.
pub fn emit_evaluation_started(key: &StatusKey, status: EvaluationStatus) {
    info!(event = "evaluation.started", key = %key, from_status = %status);
}

/// Emit event: evaluation reached a terminal status.
pub fn emit_evaluation_finished(
    key: &StatusKey,
    status: EvaluationStatus,
    composite_score: Option<f64>,
    duration_ms: u64,
) {
    info!(
        event = "evaluation.finished",
        key = %key,
        status = %status,
        composite_score = composite_score,
        duration_ms = duration_ms,
    );
}

pub fn emit_stage_started(stage: StageToken) {
    info!(event = "stage.started", stage = %stage);
}

pub fn emit_stage_completed(stage: StageToken, next: StageToken, duration_ms: u64) {
    info!(
        event = "stage.completed",
        stage = %stage,
        next = %next,
        duration_ms = duration_ms,
    );
}

/// Emit event: a stage (or intake) failed (warning level).
pub fn emit_stage_failed(stage: &str, kind: ErrorKind, error: &dyn std::fmt::Display) {
    warn!(event = "stage.failed", stage = %stage, kind = %kind, error = %error);
}

/// Emit event: the FAILED marker could not be written (warning level).
pub fn emit_failure_marker_error(key: &StatusKey, error: &dyn std::fmt::Display) {
    warn!(event = "status.failure_marker_error", key = %key, error = %error);
}

/// Emit event: a scored custom criterion has no weight and contributes zero.
pub fn emit_unweighted_criterion(key: &StatusKey, criterion: &str) {
    warn!(event = "aggregation.unweighted_criterion", key = %key, criterion = %criterion);
}
