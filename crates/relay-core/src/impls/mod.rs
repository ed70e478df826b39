//! In-process implementations of the ports, plus a local drive loop.
//!
//! These back tests and single-process runs. Production deployments are
//! expected to provide their own [`crate::ports`] implementations on top of
//! a real queue, blob store, and key-set table.

mod inmem_queue;
mod inmem_storage;
mod inmem_table;
mod local_runner;
mod local_storage;

pub use inmem_queue::InMemoryEventQueue;
pub use inmem_storage::InMemoryObjectStorage;
pub use inmem_table::InMemoryStateTable;
pub use local_runner::LocalRunner;
pub use local_storage::LocalObjectStorage;
