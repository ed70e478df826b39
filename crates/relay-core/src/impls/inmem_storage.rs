//! In-memory object storage, for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::RelayError;
use crate::ports::ObjectStorage;

/// Object storage backed by a process-local map.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn get_object(&self, storage_name: &str, path: &str) -> Result<Vec<u8>, RelayError> {
        let objects = self.objects.lock().await;
        objects
            .get(&(storage_name.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| RelayError::ObjectNotFound {
                storage_name: storage_name.to_string(),
                path: path.to_string(),
            })
    }

    async fn put_object(
        &self,
        storage_name: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RelayError> {
        let mut objects = self.objects.lock().await;
        objects.insert((storage_name.to_string(), path.to_string()), bytes);
        Ok(())
    }

    async fn delete_object(&self, storage_name: &str, path: &str) -> Result<(), RelayError> {
        let mut objects = self.objects.lock().await;
        objects.remove(&(storage_name.to_string(), path.to_string()));
        Ok(())
    }
}
