//! Stage sequencer: drives an `EvaluationRecord` through the fixed stage
//! topology until it reaches a terminal status.
//!
//! Business outcomes (REJECTED / SELECTED / IN_CONSIDERATION) and
//! operational failures (FAILED) are both normal returns. Only malformed
//! configuration is an `Err`, and it is detected before any stage runs.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use screening_state::{DocumentSource, StagePersistence, StatusStore};

use crate::cancel::CancellationSignal;
use crate::domain::{ConfigError, EvaluationInputs, EvaluationRecord, StageError};
use crate::intake::{fetch_inputs, EvaluationRequest};
use crate::metrics::ScreeningMetrics;
use crate::obs;
use crate::oracle::AssessmentOracle;
use crate::settings::ScreeningSettings;
use crate::stages::{
    AggregationStage, CulturalStage, JdFitStage, RoutingStage, Stage, StageToken,
};

/// Holds only shared adapter handles and configuration, so one sequencer
/// can drive any number of records concurrently.
pub struct StageSequencer {
    status: Arc<dyn StatusStore>,
    settings: ScreeningSettings,
    stages: Vec<Arc<dyn Stage>>,
    metrics: Arc<ScreeningMetrics>,
}

impl StageSequencer {
    pub fn new(
        oracle: Arc<dyn AssessmentOracle>,
        persistence: Arc<dyn StagePersistence>,
        status: Arc<dyn StatusStore>,
        settings: ScreeningSettings,
    ) -> Result<Self, ConfigError> {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(JdFitStage::new(
                oracle.clone(),
                persistence.clone(),
                status.clone(),
            )),
            Arc::new(RoutingStage::new(status.clone())),
            Arc::new(CulturalStage::new(oracle, persistence, status.clone())),
            Arc::new(AggregationStage::new(status.clone())),
        ];
        Self::with_stages(status, settings, stages)
    }

    pub(crate) fn with_stages(
        status: Arc<dyn StatusStore>,
        settings: ScreeningSettings,
        stages: Vec<Arc<dyn Stage>>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            status,
            settings,
            stages,
            metrics: Arc::new(ScreeningMetrics::new()),
        })
    }

    pub fn settings(&self) -> &ScreeningSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &ScreeningMetrics {
        &self.metrics
    }

    /// Run `record` to a terminal status.
    ///
    /// A record that is already terminal is returned unchanged. A record in a
    /// non-terminal status resumes at the stage matching that status.
    pub async fn run(&self, record: EvaluationRecord) -> Result<EvaluationRecord, ConfigError> {
        self.run_with_cancel(record, &CancellationSignal::never())
            .await
    }

    /// Like [`run`](Self::run), checking `cancel` before each stage.
    pub async fn run_with_cancel(
        &self,
        mut record: EvaluationRecord,
        cancel: &CancellationSignal,
    ) -> Result<EvaluationRecord, ConfigError> {
        record.weights.validate()?;
        record.thresholds.validate()?;
        if record.is_terminal() {
            return Ok(record);
        }

        let span = obs::evaluation_span(&record.status_key(), Uuid::new_v4());
        async {
            let started = Instant::now();
            obs::emit_evaluation_started(&record.status_key(), record.status());
            self.metrics.inc_evaluations_started();

            if let Err((stage, error)) = self.drive(&mut record, cancel).await {
                self.fail(&mut record, stage.as_str(), error).await;
            }
            self.finish(&record, started);
        }
        .instrument(span)
        .await;

        Ok(record)
    }

    /// Fetch the request's input documents concurrently, then run.
    ///
    /// A fetch failure yields a FAILED record with `input_fetch` (or
    /// `timeout`) as its error kind.
    pub async fn evaluate(
        &self,
        source: &dyn DocumentSource,
        request: EvaluationRequest,
    ) -> Result<EvaluationRecord, ConfigError> {
        let weights = request
            .weights
            .unwrap_or_else(|| self.settings.weights.clone());
        let thresholds = request
            .thresholds
            .unwrap_or_else(|| self.settings.thresholds.clone());
        weights.validate()?;
        thresholds.validate()?;

        let mut record = EvaluationRecord::new(
            request.candidate_id,
            request.job_id,
            EvaluationInputs::default(),
            weights,
            thresholds,
        );

        let span = obs::evaluation_span(&record.status_key(), Uuid::new_v4());
        let fetched = fetch_inputs(source, &request.inputs, self.settings.fetch_timeout())
            .instrument(span.clone())
            .await;
        match fetched {
            Ok(inputs) => {
                record.inputs = inputs;
                self.run(record).await
            }
            Err(error) => {
                async {
                    self.metrics.inc_evaluations_started();
                    self.fail(&mut record, "intake", error).await;
                    self.finish(&record, Instant::now());
                }
                .instrument(span)
                .await;
                Ok(record)
            }
        }
    }

    /// Walk the topology from the record's resume point. On failure, returns
    /// the stage that was running alongside the error.
    async fn drive(
        &self,
        record: &mut EvaluationRecord,
        cancel: &CancellationSignal,
    ) -> Result<(), (StageToken, StageError)> {
        let Some(mut token) = StageToken::resume_point(record.status()) else {
            return Ok(());
        };
        let mut visited: Vec<StageToken> = Vec::with_capacity(StageToken::TOPOLOGY_LEN);

        while token != StageToken::End {
            if visited.contains(&token) || visited.len() >= StageToken::TOPOLOGY_LEN {
                return Err((
                    token,
                    StageError::Sequencing(format!("stage '{token}' would run twice")),
                ));
            }
            visited.push(token);
            token = self
                .step(token, record, cancel)
                .await
                .map_err(|error| (token, error))?;
        }

        if !record.is_terminal() {
            return Err((
                StageToken::End,
                StageError::Sequencing(format!(
                    "topology ended with status {}",
                    record.status()
                )),
            ));
        }
        Ok(())
    }

    /// Run one stage under the stage timeout and fold its output in.
    async fn step(
        &self,
        token: StageToken,
        record: &mut EvaluationRecord,
        cancel: &CancellationSignal,
    ) -> Result<StageToken, StageError> {
        if cancel.is_cancelled() {
            return Err(StageError::Cancelled {
                stage: token.as_str(),
            });
        }

        let stage = self.stage_for(token)?;
        if let Some(entry) = token.entry_status() {
            if record.status() != entry {
                record.advance(entry)?;
            }
        }

        obs::emit_stage_started(token);
        let started = Instant::now();
        let step = match tokio::time::timeout(self.settings.stage_timeout(), stage.run(record))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                self.metrics.inc_stage_timeouts();
                return Err(StageError::Timeout {
                    stage: token.as_str().to_string(),
                    timeout_ms: self.settings.stage_timeout_ms,
                });
            }
        };

        let next = step.next;
        record.apply(step.output)?;
        self.metrics.inc_stages_completed();
        obs::emit_stage_completed(token, next, elapsed_ms(started));
        Ok(next)
    }

    fn stage_for(&self, token: StageToken) -> Result<Arc<dyn Stage>, StageError> {
        self.stages
            .iter()
            .find(|stage| stage.token() == token)
            .cloned()
            .ok_or_else(|| StageError::Sequencing(format!("no stage registered for '{token}'")))
    }

    /// Mark the record FAILED and write it to the status store, best effort.
    ///
    /// The whole record is written, so the stored record carries exactly the
    /// fields the returned record does.
    async fn fail(&self, record: &mut EvaluationRecord, stage: &str, error: StageError) {
        obs::emit_stage_failed(stage, error.kind(), &error);
        record.fail(&error);

        let update = record.status_snapshot();
        let key = record.status_key();
        match tokio::time::timeout(self.settings.stage_timeout(), self.status.update(&key, update))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(write_error)) => obs::emit_failure_marker_error(&key, &write_error),
            Err(_) => obs::emit_failure_marker_error(&key, &"status update timed out"),
        }
    }

    fn finish(&self, record: &EvaluationRecord, started: Instant) {
        self.metrics.record_outcome(record.status());
        obs::emit_evaluation_finished(
            &record.status_key(),
            record.status(),
            record.composite_score,
            elapsed_ms(started),
        );
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
