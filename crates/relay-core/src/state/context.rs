use std::sync::Arc;

use crate::ports::{ObjectStorage, StateTable};

/// Collaborators a state may touch while handling an event.
#[derive(Clone)]
pub struct StateContext {
    object_storage: Arc<dyn ObjectStorage>,
    state_table: Arc<dyn StateTable>,
}

impl StateContext {
    pub fn new(object_storage: Arc<dyn ObjectStorage>, state_table: Arc<dyn StateTable>) -> Self {
        Self {
            object_storage,
            state_table,
        }
    }

    pub fn object_storage(&self) -> &dyn ObjectStorage {
        self.object_storage.as_ref()
    }

    pub fn state_table(&self) -> &dyn StateTable {
        self.state_table.as_ref()
    }
}
