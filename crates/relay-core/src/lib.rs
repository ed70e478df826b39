//! relay-core
//!
//! A minimal asynchronous workflow engine: named states wired into a
//! directed graph, driven by events over an at-least-once channel. The
//! router looks up each event's target state, runs it, and republishes
//! whatever it produces; fork, join, and wait states are enough to express
//! sagas and pipelines without a central scheduler process.
//!
//! Module layout:
//! - **domain**: value types (ids, state names, envelopes, fragments)
//! - **ports**: contracts for the external collaborators (object storage,
//!   state table, event publisher)
//! - **state**: the four built-in state variants and their contract
//! - **router**: dispatch, fragment completion, republish
//! - **impls**: in-process port implementations and a local drive loop

pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod router;
pub mod state;

pub use domain::{
    Attributes, Envelope, EventId, OutputEvent, SOURCE_START, StateName, TraceId,
    WAIT_SECONDS_ATTRIBUTE,
};
pub use error::RelayError;
pub use ports::{EventPublisher, ObjectStorage, StateTable};
pub use router::{EventRouter, EventRouterBuilder};
pub use state::{ExecutionRunner, State, StateContext};
