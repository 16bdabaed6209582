//! Storage trait definitions for the screening pipeline
//!
//! These traits define the persistence ports the pipeline consumes:
//! - `StagePersistence`: blob storage for per-stage analysis documents
//! - `StatusStore`: key-value progress record per candidate/job pair
//! - `DocumentSource`: read-only access to the input documents
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::error::StorageError;
use crate::status::EvaluationStatus;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a job opening.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status-store key: one record per candidate/job pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusKey {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
}

impl StatusKey {
    pub fn new(candidate_id: CandidateId, job_id: JobId) -> Self {
        Self {
            candidate_id,
            job_id,
        }
    }
}

impl std::fmt::Display for StatusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.job_id, self.candidate_id)
    }
}

// ---------------------------------------------------------------------------
// StagePersistence (analysis artifacts)
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string) of a persisted artifact.
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Digest of the compact JSON encoding of `document`.
    ///
    /// Every backend stores exactly these bytes, so digests agree across
    /// backends for the same document.
    pub fn from_document(document: &Value) -> StorageResult<Self> {
        let bytes = serde_json::to_vec(document)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hierarchical artifact locator: `{job_id}/{candidate_id}/{file_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactLocator(String);

impl ArtifactLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Locator of an analysis document for one candidate/job pair.
    pub fn analysis(job_id: &JobId, candidate_id: &CandidateId, file_name: &str) -> Self {
        Self(format!("{job_id}/{candidate_id}/{file_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blob store for stage analysis documents.
///
/// Guarantees:
/// - `put` overwrites any previous document at the same locator.
/// - `put` returns the digest of the stored document (`ContentDigest::from_document`).
/// - `get` returns the document last stored at the locator.
#[async_trait]
pub trait StagePersistence: Send + Sync {
    /// Store `document` at `locator` and return its content digest.
    async fn put(&self, locator: &ArtifactLocator, document: &Value)
        -> StorageResult<ContentDigest>;

    /// Retrieve a document. Returns `StorageError::NotFound` if absent.
    async fn get(&self, locator: &ArtifactLocator) -> StorageResult<Value>;
}

// ---------------------------------------------------------------------------
// StatusStore (progress records)
// ---------------------------------------------------------------------------

/// Partial update of a status record. `None` fields are left untouched;
/// map fields are merged key by key. With `reset` set, every run-scoped
/// field is cleared before the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub reset: bool,
    pub status: Option<EvaluationStatus>,
    pub jd_score: Option<f64>,
    pub cultural_fit_score: Option<f64>,
    pub uniqueness_score: Option<f64>,
    pub custom_criteria_scores: Option<BTreeMap<String, f64>>,
    pub composite_score: Option<f64>,
    pub verdict_message: Option<String>,
    #[serde(default)]
    pub justifications: BTreeMap<String, String>,
    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactLocator>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl StatusUpdate {
    /// Update that only moves the status.
    pub fn status(status: EvaluationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Update that starts a fresh run: clears the previous run's scores,
    /// verdict, artifacts and error, then moves the status.
    pub fn restart(status: EvaluationStatus) -> Self {
        Self {
            reset: true,
            ..Self::status(status)
        }
    }
}

/// Persisted progress record for one candidate/job pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub key: StatusKey,
    pub status: EvaluationStatus,
    pub jd_score: Option<f64>,
    pub cultural_fit_score: Option<f64>,
    pub uniqueness_score: Option<f64>,
    pub custom_criteria_scores: BTreeMap<String, f64>,
    pub composite_score: Option<f64>,
    pub verdict_message: Option<String>,
    pub justifications: BTreeMap<String, String>,
    pub artifacts: BTreeMap<String, ArtifactLocator>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn new(key: StatusKey) -> Self {
        Self {
            key,
            status: EvaluationStatus::Initialized,
            jd_score: None,
            cultural_fit_score: None,
            uniqueness_score: None,
            custom_criteria_scores: BTreeMap::new(),
            composite_score: None,
            verdict_message: None,
            justifications: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            error_kind: None,
            error_message: None,
            updated_at: Utc::now(),
        }
    }

    /// Merge `update` into this record and bump `updated_at`.
    ///
    /// `error_kind` and `error_message` survive only while the status is
    /// `FAILED`.
    pub fn apply(&mut self, update: StatusUpdate) {
        if update.reset {
            self.clear_run_fields();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.jd_score.is_some() {
            self.jd_score = update.jd_score;
        }
        if update.cultural_fit_score.is_some() {
            self.cultural_fit_score = update.cultural_fit_score;
        }
        if update.uniqueness_score.is_some() {
            self.uniqueness_score = update.uniqueness_score;
        }
        if let Some(custom) = update.custom_criteria_scores {
            self.custom_criteria_scores = custom;
        }
        if update.composite_score.is_some() {
            self.composite_score = update.composite_score;
        }
        if update.verdict_message.is_some() {
            self.verdict_message = update.verdict_message;
        }
        self.justifications.extend(update.justifications);
        self.artifacts.extend(update.artifacts);
        if update.error_kind.is_some() {
            self.error_kind = update.error_kind;
        }
        if update.error_message.is_some() {
            self.error_message = update.error_message;
        }
        if self.status != EvaluationStatus::Failed {
            self.error_kind = None;
            self.error_message = None;
        }
        self.updated_at = Utc::now();
    }

    fn clear_run_fields(&mut self) {
        self.jd_score = None;
        self.cultural_fit_score = None;
        self.uniqueness_score = None;
        self.custom_criteria_scores.clear();
        self.composite_score = None;
        self.verdict_message = None;
        self.justifications.clear();
        self.artifacts.clear();
        self.error_kind = None;
        self.error_message = None;
    }
}

/// Key-value store of evaluation progress.
///
/// Guarantees:
/// - `update` creates the record on first write (status `INITIALIZED` unless set).
/// - `update` merges fields as `StatusRecord::apply` does; only a `reset`
///   update or a move away from `FAILED` clears a previously written field.
/// - `get` reflects every completed `update` for the key.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Merge `update` into the record for `key`.
    async fn update(&self, key: &StatusKey, update: StatusUpdate) -> StorageResult<()>;

    /// Read the record for `key`. Returns `StorageError::StatusNotFound` if absent.
    async fn get(&self, key: &StatusKey) -> StorageResult<StatusRecord>;
}

// ---------------------------------------------------------------------------
// DocumentSource (input documents)
// ---------------------------------------------------------------------------

/// Read-only source of structured input documents (resume, job description,
/// company values, uniqueness definition, custom criteria).
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the document at `locator`. Returns `StorageError::NotFound` if absent.
    async fn fetch(&self, locator: &str) -> StorageResult<Value>;
}
