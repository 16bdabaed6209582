//! Domain types for the screening pipeline.

pub mod config;
pub mod error;
pub mod record;

pub use config::{ThresholdConfig, WeightConfig};
pub use error::{ConfigError, ErrorKind, StageError};
pub use record::{ArtifactRef, EvaluationInputs, EvaluationRecord, Justifications};
