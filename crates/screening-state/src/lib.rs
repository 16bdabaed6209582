//! Screening-State: persistence layer for the candidate screening pipeline.
//!
//! Defines the storage ports the pipeline talks to and ships two kinds of
//! backends for them.
//!
//! ## Key Components
//!
//! - `StagePersistence`: analysis artifacts keyed by `{job_id}/{candidate_id}/{file}`
//! - `StatusStore`: merged progress record per candidate/job pair
//! - `DocumentSource`: read-only input documents
//! - `FsStagePersistence`: local filesystem artifact store
//! - `fakes`: in-memory implementations with failure injection

mod error;
pub mod fakes;
mod fs;
pub mod status;
pub mod storage_traits;

pub use error::StorageError;
pub use fs::FsStagePersistence;
pub use status::EvaluationStatus;
pub use storage_traits::{
    ArtifactLocator, CandidateId, ContentDigest, DocumentSource, JobId, StagePersistence,
    StatusKey, StatusRecord, StatusStore, StatusUpdate, StorageResult,
};
