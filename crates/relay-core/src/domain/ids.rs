//! Strongly-typed identifiers.
//!
//! Ids generated here are ULIDs, but the wrapper stores the rendered string
//! and treats inbound ids as opaque: envelopes arriving over the wire may
//! carry ids minted by another process in a different format (UUIDs, for
//! one), and the engine only ever compares and propagates them. The phantom
//! marker keeps an [`EventId`] and a [`TraceId`] apart at call sites even
//! though both are plain strings on the wire.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Marker trait for the kind of thing an [`Id`] identifies.
pub trait IdMarker: Send + Sync + 'static {}

/// Generic opaque identifier.
///
/// The marker type `T` is `PhantomData`: zero bytes at runtime, but the
/// compiler keeps the id kinds apart.
///
/// Serializes as the bare string, which is what the event wire shape
/// expects (`id` and `traceId` are plain strings).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// Generate a fresh identifier (a ULID, rendered to its string form).
    pub fn generate() -> Self {
        Self::new(Ulid::new().to_string())
    }

    /// Wrap an existing id value, whatever its format.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// Marker type for event identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {}

impl IdMarker for Event {}

/// Marker type for trace identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trace {}

impl IdMarker for Trace {}

/// Identifier of a single event envelope (fresh on every hop).
pub type EventId = Id<Event>;

/// Correlation identifier shared by every envelope descending from one
/// genesis event.
pub type TraceId = Id<Trace>;

impl From<EventId> for TraceId {
    /// The first envelope of a run uses its own id as the trace id.
    fn from(id: EventId) -> Self {
        TraceId::new(id.value)
    }
}
