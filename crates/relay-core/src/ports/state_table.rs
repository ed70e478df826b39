//! StateTable port - the join accumulator backing store.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::RelayError;

/// Durable key-to-set-of-strings table.
///
/// This is the only mutable resource shared across router invocations: join
/// states record which source states have already reported under a
/// per-(join, trace) key.
///
/// Required contract: concurrent `add_member` calls for the same key must be
/// linearizable set unions. Members must never be lost to a last-write-wins
/// overwrite, or two branches racing on a join could miss the rendezvous.
#[async_trait]
pub trait StateTable: Send + Sync {
    /// Read the member set stored under `key`. Empty if the key is absent.
    async fn get_members(&self, key: &str) -> Result<BTreeSet<String>, RelayError>;

    /// Add `member` to the set under `key`, creating the set if absent.
    async fn add_member(&self, key: &str, member: &str) -> Result<(), RelayError>;

    /// Remove `key` and its whole set.
    async fn delete_key(&self, key: &str) -> Result<(), RelayError>;
}
