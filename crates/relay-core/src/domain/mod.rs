//! Domain model (identifiers, state names, event envelopes).

pub mod event;
pub mod ids;
pub mod state_name;

pub use event::{Attributes, Envelope, OutputEvent, SOURCE_START, WAIT_SECONDS_ATTRIBUTE};
pub use ids::{EventId, TraceId};
pub use state_name::StateName;
