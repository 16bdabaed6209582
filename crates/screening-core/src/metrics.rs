//! Atomic counters for screening observability.
//!
//! Each `StageSequencer` owns one `ScreeningMetrics`; counters are
//! incremented silently at the call site. Call [`ScreeningMetrics::flush`]
//! to emit current values as a single `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

use screening_state::EvaluationStatus;

/// Lightweight atomic counters, no allocations, no locking.
#[derive(Debug, Default)]
pub struct ScreeningMetrics {
    evaluations_started: AtomicU64,
    stages_completed: AtomicU64,
    stage_timeouts: AtomicU64,
    rejected: AtomicU64,
    selected: AtomicU64,
    in_consideration: AtomicU64,
    failed: AtomicU64,
}

impl ScreeningMetrics {
    pub const fn new() -> Self {
        Self {
            evaluations_started: AtomicU64::new(0),
            stages_completed: AtomicU64::new(0),
            stage_timeouts: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            selected: AtomicU64::new(0),
            in_consideration: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn inc_evaluations_started(&self) {
        self.evaluations_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "evaluations_started", "counter incremented");
    }

    pub fn inc_stages_completed(&self) {
        self.stages_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stages_completed", "counter incremented");
    }

    pub fn inc_stage_timeouts(&self) {
        self.stage_timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stage_timeouts", "counter incremented");
    }

    /// Count a finished evaluation under its terminal status.
    pub fn record_outcome(&self, status: EvaluationStatus) {
        let counter = match status {
            EvaluationStatus::Rejected => &self.rejected,
            EvaluationStatus::Selected => &self.selected,
            EvaluationStatus::InConsideration => &self.in_consideration,
            EvaluationStatus::Failed => &self.failed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "outcome", status = %status, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            evaluations_started = self.evaluations_started(),
            stages_completed = self.stages_completed(),
            stage_timeouts = self.stage_timeouts(),
            rejected = self.rejected(),
            selected = self.selected(),
            in_consideration = self.in_consideration(),
            failed = self.failed(),
        );
    }

    pub fn evaluations_started(&self) -> u64 {
        self.evaluations_started.load(Ordering::Relaxed)
    }

    pub fn stages_completed(&self) -> u64 {
        self.stages_completed.load(Ordering::Relaxed)
    }

    pub fn stage_timeouts(&self) -> u64 {
        self.stage_timeouts.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn selected(&self) -> u64 {
        self.selected.load(Ordering::Relaxed)
    }

    pub fn in_consideration(&self) -> u64 {
        self.in_consideration.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.evaluations_started,
            &self.stages_completed,
            &self.stage_timeouts,
            &self.rejected,
            &self.selected,
            &self.in_consideration,
            &self.failed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
