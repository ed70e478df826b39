//! ObjectStorage port - blob storage used by execution callbacks.

use async_trait::async_trait;

use crate::error::RelayError;

/// Key-addressed blob storage.
///
/// Consumed exclusively inside execution-state callbacks. The engine places
/// no structure requirements on `storage_name` or `path`; implementations
/// must provide read-after-write consistency for the keys a single run
/// touches. Callbacks re-run under at-least-once delivery, so writes should
/// use overwrite semantics.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Read an object. Fails with [`RelayError::ObjectNotFound`] when the
    /// key does not exist.
    async fn get_object(&self, storage_name: &str, path: &str) -> Result<Vec<u8>, RelayError>;

    /// Write an object, replacing any previous value.
    async fn put_object(
        &self,
        storage_name: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RelayError>;

    /// Delete an object.
    async fn delete_object(&self, storage_name: &str, path: &str) -> Result<(), RelayError>;

    /// Read an object as a UTF-8 string.
    async fn get_string(&self, storage_name: &str, path: &str) -> Result<String, RelayError> {
        let bytes = self.get_object(storage_name, path).await?;
        String::from_utf8(bytes)
            .map_err(|e| RelayError::Storage(format!("{storage_name}/{path} is not UTF-8: {e}")))
    }

    /// Write a string as an object.
    async fn put_string(
        &self,
        storage_name: &str,
        path: &str,
        value: &str,
    ) -> Result<(), RelayError> {
        self.put_object(storage_name, path, value.as_bytes().to_vec())
            .await
    }
}
