//! State - the polymorphic unit of work.
//!
//! Four built-in variants, kept as a closed enum rather than one trait
//! object per behavior: execution (run a callback, continue to one target),
//! fork (fan out to a fixed list of targets), join (rendezvous on a required
//! set of source states), and wait (tag the output with a delay hint).

mod context;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Envelope, OutputEvent, StateName, TraceId, WAIT_SECONDS_ATTRIBUTE};
use crate::error::RelayError;

pub use context::StateContext;

/// Side-effecting callback run by an execution state.
///
/// Delivery is at-least-once, so runners must tolerate duplicate
/// invocation (overwrite semantics on storage writes). This is a caller
/// obligation, not enforced by the engine.
#[async_trait]
pub trait ExecutionRunner: Send + Sync {
    async fn run(&self, ctx: &StateContext) -> Result<(), RelayError>;
}

/// Separator inside join accumulator keys: `{state}|{trace}`.
const JOIN_KEY_SEPARATOR: char = '|';

/// A named state wired into the workflow graph.
pub struct State {
    name: StateName,
    kind: StateKind,
}

enum StateKind {
    Execution {
        target: StateName,
        runner: Arc<dyn ExecutionRunner>,
    },
    Fork {
        targets: Vec<StateName>,
    },
    Join {
        required_sources: BTreeSet<StateName>,
        target: StateName,
    },
    Wait {
        target: StateName,
        delay_seconds: u64,
    },
}

impl State {
    /// Execution state: run `runner`, then continue to `target` with the
    /// input's attributes.
    pub fn execution(
        name: impl Into<StateName>,
        target: impl Into<StateName>,
        runner: Arc<dyn ExecutionRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: StateKind::Execution {
                target: target.into(),
                runner,
            },
        }
    }

    /// Fork state: one output per target, in declaration order.
    pub fn fork(
        name: impl Into<StateName>,
        targets: Vec<StateName>,
    ) -> Result<Self, RelayError> {
        let name = name.into();
        if targets.is_empty() {
            return Err(RelayError::EmptyFork(name));
        }
        Ok(Self {
            name,
            kind: StateKind::Fork { targets },
        })
    }

    /// Join state: emit once to `target` when every state in
    /// `required_sources` has reported for the input's trace.
    pub fn join(
        name: impl Into<StateName>,
        required_sources: BTreeSet<StateName>,
        target: impl Into<StateName>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: StateKind::Join {
                required_sources,
                target: target.into(),
            },
        }
    }

    /// Wait state: continue to `target` with a delay hint of
    /// `delay_seconds` stamped into the attributes.
    pub fn wait(
        name: impl Into<StateName>,
        target: impl Into<StateName>,
        delay_seconds: i64,
    ) -> Result<Self, RelayError> {
        if delay_seconds < 0 {
            return Err(RelayError::NegativeDelay(delay_seconds));
        }
        Ok(Self {
            name: name.into(),
            kind: StateKind::Wait {
                target: target.into(),
                delay_seconds: delay_seconds as u64,
            },
        })
    }

    pub fn name(&self) -> &StateName {
        &self.name
    }

    /// Handle one input envelope, producing zero or more output fragments.
    pub async fn handle(
        &self,
        ctx: &StateContext,
        input: &Envelope,
    ) -> Result<Vec<OutputEvent>, RelayError> {
        let outputs = match &self.kind {
            StateKind::Execution { target, runner } => {
                runner.run(ctx).await?;
                vec![OutputEvent::new(target.clone(), input.attributes().clone())]
            }
            StateKind::Fork { targets } => targets
                .iter()
                .map(|target| OutputEvent::new(target.clone(), input.attributes().clone()))
                .collect(),
            StateKind::Join {
                required_sources,
                target,
            } => {
                self.handle_join(ctx, input, required_sources, target)
                    .await?
            }
            StateKind::Wait {
                target,
                delay_seconds,
            } => {
                let mut attributes = input.attributes().clone();
                attributes.insert(WAIT_SECONDS_ATTRIBUTE.to_string(), delay_seconds.to_string());
                vec![OutputEvent::new(target.clone(), attributes)]
            }
        };

        debug!(
            state = %self.name,
            event_id = %input.id(),
            outputs = outputs.len(),
            "transition"
        );
        Ok(outputs)
    }

    /// Rendezvous bookkeeping, keyed by `(this state, input trace)`.
    ///
    /// Duplicate arrivals of the same source are absorbed by set semantics,
    /// which is what makes the join idempotent under redelivery. On
    /// completion the accumulator is consumed, so no partial state is left
    /// behind for a finished trace.
    async fn handle_join(
        &self,
        ctx: &StateContext,
        input: &Envelope,
        required_sources: &BTreeSet<StateName>,
        target: &StateName,
    ) -> Result<Vec<OutputEvent>, RelayError> {
        let key = join_key(&self.name, input.trace_id());

        let mut reported = ctx.state_table().get_members(&key).await?;
        reported.insert(input.source_state().as_str().to_string());
        debug!(key = %key, reported = ?reported, "join arrivals");

        if required_sources
            .iter()
            .all(|source| reported.contains(source.as_str()))
        {
            let output = OutputEvent::new(target.clone(), input.attributes().clone());
            ctx.state_table().delete_key(&key).await?;
            debug!(key = %key, event_id = %output.id(), "join complete");
            Ok(vec![output])
        } else {
            ctx.state_table()
                .add_member(&key, input.source_state().as_str())
                .await?;
            debug!(key = %key, "join still waiting");
            Ok(vec![])
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            StateKind::Execution { target, .. } => format!("Execution -> {target}"),
            StateKind::Fork { targets } => format!("Fork -> {targets:?}"),
            StateKind::Join { target, .. } => format!("Join -> {target}"),
            StateKind::Wait {
                target,
                delay_seconds,
            } => format!("Wait({delay_seconds}s) -> {target}"),
        };
        f.debug_struct("State")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

fn join_key(state_name: &StateName, trace_id: TraceId) -> String {
    format!("{state_name}{JOIN_KEY_SEPARATOR}{trace_id}")
}
