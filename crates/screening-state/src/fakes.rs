//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryStagePersistence`, `MemoryStatusStore`, and
//! `MemoryDocumentSource` that satisfy the trait contracts without any
//! external dependencies. Each fake can be told to fail so callers can
//! exercise their error paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::status::EvaluationStatus;
use crate::storage_traits::*;

fn lock<T>(mutex: &Mutex<T>) -> StorageResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StorageError::Unavailable("fake store lock poisoned".to_string()))
}

// ---------------------------------------------------------------------------
// MemoryStagePersistence
// ---------------------------------------------------------------------------

/// In-memory artifact store backed by a `HashMap<locator, document>`.
#[derive(Debug, Default)]
pub struct MemoryStagePersistence {
    documents: Mutex<HashMap<String, Value>>,
    fail_puts: AtomicBool,
    puts: AtomicUsize,
}

impl MemoryStagePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail with `StorageError::Unavailable`.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `put` calls.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn contains(&self, locator: &ArtifactLocator) -> bool {
        lock(&self.documents)
            .map(|docs| docs.contains_key(locator.as_str()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl StagePersistence for MemoryStagePersistence {
    async fn put(
        &self,
        locator: &ArtifactLocator,
        document: &Value,
    ) -> StorageResult<ContentDigest> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "put rejected for {locator}"
            )));
        }
        let digest = ContentDigest::from_document(document)?;
        lock(&self.documents)?.insert(locator.as_str().to_string(), document.clone());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(digest)
    }

    async fn get(&self, locator: &ArtifactLocator) -> StorageResult<Value> {
        lock(&self.documents)?
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                locator: locator.as_str().to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryStatusStore
// ---------------------------------------------------------------------------

/// In-memory status store backed by a `HashMap<StatusKey, StatusRecord>`.
///
/// Also keeps the sequence of statuses written per key so tests can assert
/// on progress markers.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    records: Mutex<HashMap<StatusKey, StatusRecord>>,
    history: Mutex<HashMap<StatusKey, Vec<EvaluationStatus>>>,
    fail_on: Mutex<HashSet<EvaluationStatus>>,
    fail_all: AtomicBool,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `update` fail.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Fail only updates that move the record to `status`.
    pub fn fail_on_status(&self, status: EvaluationStatus) {
        if let Ok(mut fail_on) = lock(&self.fail_on) {
            fail_on.insert(status);
        }
    }

    /// Statuses written for `key`, in write order.
    pub fn history(&self, key: &StatusKey) -> Vec<EvaluationStatus> {
        lock(&self.history)
            .ok()
            .and_then(|h| h.get(key).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn update(&self, key: &StatusKey, update: StatusUpdate) -> StorageResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "status update rejected for {key}"
            )));
        }
        if let Some(status) = update.status {
            if lock(&self.fail_on)?.contains(&status) {
                return Err(StorageError::Unavailable(format!(
                    "status update to {status} rejected for {key}"
                )));
            }
            lock(&self.history)?
                .entry(key.clone())
                .or_default()
                .push(status);
        }
        lock(&self.records)?
            .entry(key.clone())
            .or_insert_with(|| StatusRecord::new(key.clone()))
            .apply(update);
        Ok(())
    }

    async fn get(&self, key: &StatusKey) -> StorageResult<StatusRecord> {
        lock(&self.records)?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::StatusNotFound {
                candidate_id: key.candidate_id.0.clone(),
                job_id: key.job_id.0.clone(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryDocumentSource
// ---------------------------------------------------------------------------

/// In-memory document source with optional per-locator failures and delays.
#[derive(Debug, Default)]
pub struct MemoryDocumentSource {
    documents: HashMap<String, Value>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    fetches: AtomicUsize,
}

impl MemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, locator: impl Into<String>, document: Value) -> Self {
        self.documents.insert(locator.into(), document);
        self
    }

    /// Fetches of `locator` fail with `StorageError::Unavailable`.
    pub fn with_failure(mut self, locator: impl Into<String>) -> Self {
        self.failing.insert(locator.into());
        self
    }

    /// Fetches of `locator` sleep for `delay` before answering.
    pub fn with_delay(mut self, locator: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(locator.into(), delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocumentSource {
    async fn fetch(&self, locator: &str) -> StorageResult<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(locator) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(locator) {
            return Err(StorageError::Unavailable(format!(
                "document source refused {locator}"
            )));
        }
        self.documents
            .get(locator)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                locator: locator.to_string(),
            })
    }
}
