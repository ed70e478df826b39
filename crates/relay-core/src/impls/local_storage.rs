//! Filesystem-backed object storage for local runs.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::RelayError;
use crate::ports::ObjectStorage;

/// Object storage rooted at a local directory.
///
/// Objects live at `{root}/{storage_name}/{path}`. Names are validated so a
/// crafted `path` cannot escape the root.
#[derive(Debug)]
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    /// The root must already exist and be a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RelayError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RelayError::Storage(format!(
                "object storage root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    fn compute_path(&self, storage_name: &str, path: &str) -> Result<PathBuf, RelayError> {
        validate_relative(storage_name)?;
        validate_relative(path)?;
        Ok(self.root.join(storage_name).join(path))
    }
}

/// Reject absolute paths and parent-directory traversal.
fn validate_relative(value: &str) -> Result<(), RelayError> {
    if value.is_empty() {
        return Err(RelayError::Storage("empty storage path".to_string()));
    }
    let ok = Path::new(value)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !ok {
        return Err(RelayError::Storage(format!("invalid storage path: {value}")));
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn get_object(&self, storage_name: &str, path: &str) -> Result<Vec<u8>, RelayError> {
        let file_path = self.compute_path(storage_name, path)?;
        match fs::read(&file_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RelayError::ObjectNotFound {
                    storage_name: storage_name.to_string(),
                    path: path.to_string(),
                })
            }
            Err(e) => Err(RelayError::Storage(format!(
                "cannot read {}: {e}",
                file_path.display()
            ))),
        }
    }

    async fn put_object(
        &self,
        storage_name: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RelayError> {
        let file_path = self.compute_path(storage_name, path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                RelayError::Storage(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&file_path, bytes).await.map_err(|e| {
            RelayError::Storage(format!("cannot write {}: {e}", file_path.display()))
        })
    }

    async fn delete_object(&self, storage_name: &str, path: &str) -> Result<(), RelayError> {
        let file_path = self.compute_path(storage_name, path)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            // Deleting an absent object is a no-op, which keeps redelivered
            // deletes harmless.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RelayError::Storage(format!(
                "cannot delete {}: {e}",
                file_path.display()
            ))),
        }
    }
}
