//! Error types for screening-state

use thiserror::Error;

/// Errors raised by the persistence ports and their backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No artifact or document exists at the locator
    #[error("not found: {locator}")]
    NotFound { locator: String },

    /// No status record exists for the candidate/job pair
    #[error("status record not found for candidate '{candidate_id}' job '{job_id}'")]
    StatusNotFound {
        candidate_id: String,
        job_id: String,
    },

    /// Digest string is not 64 hex characters
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Locator cannot be mapped onto the backend's namespace
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// Backend refused or failed the operation
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
