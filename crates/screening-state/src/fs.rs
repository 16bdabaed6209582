//! Filesystem-backed artifact store.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::{ArtifactLocator, ContentDigest, StagePersistence, StorageResult};

/// Stores each analysis document as a JSON file under `root`, mirroring the
/// locator hierarchy.
///
/// Layout: `<root>/<job_id>/<candidate_id>/<file_name>`
#[derive(Debug, Clone)]
pub struct FsStagePersistence {
    root: PathBuf,
}

impl FsStagePersistence {
    /// Create a store rooted at `root`. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, locator: &ArtifactLocator) -> StorageResult<PathBuf> {
        let relative = Path::new(locator.as_str());
        if locator.as_str().is_empty() {
            return Err(invalid(locator, "empty locator"));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(invalid(locator, "locator must be a relative path without '..'")),
            }
        }
        Ok(self.root.join(relative))
    }
}

fn invalid(locator: &ArtifactLocator, reason: &str) -> StorageError {
    StorageError::InvalidLocator {
        locator: locator.as_str().to_string(),
        reason: reason.to_string(),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::Unavailable(format!("no parent for {}", path.display())))?;
    fs::create_dir_all(dir)?;

    // Write to a temp file in the same directory, then rename.
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl StagePersistence for FsStagePersistence {
    async fn put(
        &self,
        locator: &ArtifactLocator,
        document: &Value,
    ) -> StorageResult<ContentDigest> {
        let path = self.document_path(locator)?;
        let bytes = serde_json::to_vec(document)?;
        let digest = ContentDigest::from_bytes(&bytes);

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StorageError::Unavailable(format!("write task failed: {e}")))??;

        debug!(locator = %locator, digest = %digest.short(), "artifact stored");
        Ok(digest)
    }

    async fn get(&self, locator: &ArtifactLocator) -> StorageResult<Value> {
        let path = self.document_path(locator)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    locator: locator.as_str().to_string(),
                }
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
