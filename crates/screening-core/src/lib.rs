//! Screening Core Library
//!
//! Evaluates a candidate against a job description and a set of qualitative
//! criteria by driving a fixed sequence of stages:
//!
//! 1. job-fit assessment (oracle capability `jd_fit`)
//! 2. routing gate on the job-fit score
//! 3. cultural / uniqueness / custom-criteria assessment
//!    (oracle capability `cultural_uniqueness_custom`)
//! 4. weighted aggregation and threshold classification
//!
//! The oracle, artifact store, status store and document source are ports;
//! see `screening_state` for their definitions and in-memory fakes.

pub mod aggregate;
pub mod cancel;
pub mod decision;
pub mod domain;
pub mod intake;
pub mod metrics;
pub mod obs;
pub mod oracle;
pub mod sequencer;
pub mod settings;
pub mod stages;
pub mod telemetry;

pub use aggregate::{aggregate, AggregationError, CompositeBreakdown, Contribution, SubScores};
pub use cancel::{CancellationHandle, CancellationSignal};
pub use decision::{classify, route, verdict_for, Decision, RoutingOutcome, Verdict};
pub use domain::{
    ArtifactRef, ConfigError, ErrorKind, EvaluationInputs, EvaluationRecord, Justifications,
    StageError, ThresholdConfig, WeightConfig,
};
pub use intake::{fetch_inputs, EvaluationRequest, InputKind, InputLocators};
pub use metrics::ScreeningMetrics;
pub use oracle::{
    AssessmentOracle, AssessmentRequest, Capability, CulturalAssessment, JdFitAssessment,
    JsonFieldSchema, OracleError, ResponseParseError,
};
pub use sequencer::StageSequencer;
pub use settings::ScreeningSettings;
pub use stages::{StageToken, CULTURAL_ANALYSIS_FILE, JD_ANALYSIS_FILE};
pub use telemetry::{init_tracing, init_tracing_from_env};

pub use screening_state::{
    ArtifactLocator, CandidateId, ContentDigest, DocumentSource, EvaluationStatus, JobId,
    StagePersistence, StatusKey, StatusRecord, StatusStore, StatusUpdate, StorageError,
};
