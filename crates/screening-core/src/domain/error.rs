//! Error taxonomy for the screening pipeline.

use serde::{Deserialize, Serialize};
use screening_state::StorageError;

use crate::aggregate::AggregationError;
use crate::oracle::{OracleError, ResponseParseError};

/// Category recorded on a `FAILED` evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputFetch,
    Oracle,
    Timeout,
    ResponseParse,
    Persistence,
    Config,
    InternalAggregation,
    Cancelled,
    Sequencing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputFetch => "input_fetch",
            Self::Oracle => "oracle",
            Self::Timeout => "timeout",
            Self::ResponseParse => "response_parse",
            Self::Persistence => "persistence",
            Self::Config => "config",
            Self::InternalAggregation => "internal_aggregation",
            Self::Cancelled => "cancelled",
            Self::Sequencing => "sequencing",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed weights, thresholds or settings. Detected before any stage runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight { name: String, value: f64 },

    #[error("threshold '{name}' must be finite, got {value}")]
    NonFiniteThreshold { name: &'static str, value: f64 },

    #[error("routing threshold must lie in [0, 10], got {value}")]
    RoutingThresholdOutOfRange { value: f64 },

    #[error("error boundary must be non-negative, got {value}")]
    NegativeErrorBoundary { value: f64 },

    #[error("timeout '{name}' must be greater than zero")]
    ZeroTimeout { name: &'static str },

    #[error("settings could not be parsed: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}

/// Failure of a single stage (or of intake). Converted into a terminal
/// `FAILED` record by the sequencer; never escapes `run`.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("input '{input}' could not be fetched: {source}")]
    InputFetch {
        input: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("oracle call for capability '{capability}' failed: {source}")]
    Oracle {
        capability: &'static str,
        #[source]
        source: OracleError,
    },

    #[error("'{stage}' timed out after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    #[error(transparent)]
    ResponseParse(#[from] ResponseParseError),

    #[error("persistence failed while {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("evaluation cancelled before stage '{stage}'")]
    Cancelled { stage: &'static str },

    #[error("stage sequencing error: {0}")]
    Sequencing(String),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputFetch { .. } => ErrorKind::InputFetch,
            Self::Oracle { .. } => ErrorKind::Oracle,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ResponseParse(_) => ErrorKind::ResponseParse,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::Aggregation(_) => ErrorKind::InternalAggregation,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Sequencing(_) => ErrorKind::Sequencing,
        }
    }

    /// Adapter for `map_err` on storage calls.
    pub(crate) fn persistence(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Persistence { operation, source }
    }
}
