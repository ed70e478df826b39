//! Ports - contracts for the external collaborators the engine consumes.
//!
//! The engine itself holds no durable state. Everything that must survive a
//! router invocation lives behind one of these traits: blob storage for
//! execution callbacks, the join accumulator table, and the event channel.

pub mod event_publisher;
pub mod object_storage;
pub mod state_table;

pub use self::event_publisher::{EventPublisher, delay_hint};
pub use self::object_storage::ObjectStorage;
pub use self::state_table::StateTable;
