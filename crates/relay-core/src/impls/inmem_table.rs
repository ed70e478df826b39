//! In-memory state table, for tests and local runs.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::RelayError;
use crate::ports::StateTable;

/// Join accumulator table backed by a process-local map.
///
/// A single mutex guards the whole table, so `add_member` calls are
/// trivially linearizable set unions.
#[derive(Default)]
pub struct InMemoryStateTable {
    table: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl InMemoryStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live accumulator keys.
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}

#[async_trait]
impl StateTable for InMemoryStateTable {
    async fn get_members(&self, key: &str) -> Result<BTreeSet<String>, RelayError> {
        let table = self.table.lock().await;
        Ok(table.get(key).cloned().unwrap_or_default())
    }

    async fn add_member(&self, key: &str, member: &str) -> Result<(), RelayError> {
        let mut table = self.table.lock().await;
        table
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> Result<(), RelayError> {
        let mut table = self.table.lock().await;
        table.remove(key);
        Ok(())
    }
}
