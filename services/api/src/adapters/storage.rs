//! services/api/src/adapters/storage.rs
//!
//! Local-disk implementation of the `FileStorage` port. Storage paths are
//! always relative to the configured upload directory.

use async_trait::async_trait;
use booknotes_core::ports::{FileStorage, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Stores uploads under a single root directory.
#[derive(Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a storage path, refusing anything that could escape the root.
    fn resolve(&self, path: &str) -> PortResult<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || path.is_empty() {
            return Err(PortError::BadRequest(format!("Invalid storage path '{}'", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, path: &str, data: &[u8]) -> PortResult<PathBuf> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&target, data)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {}: {}", target.display(), e)))?;
        debug!("Stored {} bytes at {}", data.len(), target.display());
        Ok(target)
    }

    async fn read(&self, path: &str) -> PortResult<Vec<u8>> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PortError::NotFound(format!("File {} not found", path)),
            _ => PortError::Unexpected(format!("Failed to read {}: {}", target.display(), e)),
        })
    }

    async fn remove(&self, path: &str) -> PortResult<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("File {} was already gone", target.display());
                Ok(())
            }
            Err(e) => Err(PortError::Unexpected(format!(
                "Failed to remove {}: {}",
                target.display(),
                e
            ))),
        }
    }

    fn locate(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}
