//! Event envelope and output fragments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ids::{EventId, TraceId};
use super::state_name::StateName;

/// Source-state marker carried by the first envelope of a run.
pub const SOURCE_START: &str = "start";

/// Reserved attribute key instructing the publisher to delay delivery by
/// the given number of seconds. The publisher strips it before the event
/// becomes visible again.
pub const WAIT_SECONDS_ATTRIBUTE: &str = "__wait_seconds__";

/// Opaque string-keyed payload carried hop to hop.
///
/// States may read, add, or drop keys; unrecognized keys pass through
/// unchanged.
pub type Attributes = HashMap<String, String>;

/// The full event record flowing through the engine.
///
/// Immutable once constructed; every hop produces a new envelope via
/// [`Envelope::next_hop`]. The serialized form is the cross-process wire
/// shape: exactly `id`, `traceId`, `ttl`, `sourceState`, `targetState`,
/// `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    id: EventId,
    trace_id: TraceId,
    ttl: u32,
    source_state: StateName,
    target_state: StateName,
    attributes: Attributes,
}

impl Envelope {
    pub fn new(
        id: EventId,
        trace_id: TraceId,
        ttl: u32,
        source_state: StateName,
        target_state: StateName,
        attributes: Attributes,
    ) -> Self {
        Self {
            id,
            trace_id,
            ttl,
            source_state,
            target_state,
            attributes,
        }
    }

    /// First envelope of a run. Its trace id equals its own id and its
    /// source state is the [`SOURCE_START`] marker.
    pub fn genesis(ttl: u32, target_state: StateName, attributes: Attributes) -> Self {
        let id = EventId::generate();
        Self {
            trace_id: TraceId::from(id.clone()),
            id,
            ttl,
            source_state: StateName::new(SOURCE_START),
            target_state,
            attributes,
        }
    }

    /// Complete an output fragment into a full envelope.
    ///
    /// The fragment keeps its own fresh id; the trace id is inherited, the
    /// ttl is decremented by one hop, and the source state becomes the
    /// input's own target (the state that produced the fragment).
    pub fn next_hop(input: &Envelope, output: OutputEvent) -> Self {
        Self {
            id: output.id,
            trace_id: input.trace_id.clone(),
            ttl: input.ttl.saturating_sub(1),
            source_state: input.target_state.clone(),
            target_state: output.target_state,
            attributes: output.attributes,
        }
    }

    pub fn id(&self) -> EventId {
        self.id.clone()
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id.clone()
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn source_state(&self) -> &StateName {
        &self.source_state
    }

    pub fn target_state(&self) -> &StateName {
        &self.target_state
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Copy of this envelope with one attribute removed.
    pub fn without_attribute(&self, key: &str) -> Self {
        let mut attributes = self.attributes.clone();
        attributes.remove(key);
        Self {
            attributes,
            ..self.clone()
        }
    }
}

/// Output fragment produced by a state.
///
/// Not yet routable: it only names the next target and carries attributes.
/// The router completes it into an [`Envelope`] before publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    id: EventId,
    target_state: StateName,
    attributes: Attributes,
}

impl OutputEvent {
    /// New fragment with a freshly generated id.
    pub fn new(target_state: StateName, attributes: Attributes) -> Self {
        Self {
            id: EventId::generate(),
            target_state,
            attributes,
        }
    }

    pub fn id(&self) -> EventId {
        self.id.clone()
    }

    pub fn target_state(&self) -> &StateName {
        &self.target_state
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
