use thiserror::Error;

use crate::domain::{EventId, StateName};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("state {0} is already defined")]
    DuplicateState(StateName),

    #[error("fork state {0} must have at least one target")]
    EmptyFork(StateName),

    #[error("wait duration cannot be negative: {0}")]
    NegativeDelay(i64),

    #[error("invalid wait duration: {0}")]
    InvalidDelay(String),

    #[error("event {0}: state failed")]
    StateFailed(EventId),

    #[error("event {0}: failed to produce event")]
    PublishFailed(EventId),

    #[error("object not found: {storage_name}/{path}")]
    ObjectNotFound { storage_name: String, path: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("state table error: {0}")]
    Table(String),

    #[error("{0}")]
    Other(String),
}
