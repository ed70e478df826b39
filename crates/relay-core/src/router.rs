//! Event router - dispatches envelopes to states and republishes outputs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::domain::{Envelope, StateName};
use crate::error::RelayError;
use crate::ports::EventPublisher;
use crate::state::{State, StateContext};

/// Routes one inbound envelope at a time: ttl and registry checks, state
/// invocation, fragment completion, sequential republish.
///
/// The router is stateless across invocations; the only state that survives
/// a call is whatever the join table holds. Expired and unroutable events
/// are silent no-ops, handler and publish failures surface as single opaque
/// errors and leave retry policy to the outer delivery layer.
pub struct EventRouter {
    context: StateContext,
    publisher: Arc<dyn EventPublisher>,
    states: HashMap<StateName, State>,
}

impl EventRouter {
    pub fn builder(context: StateContext, publisher: Arc<dyn EventPublisher>) -> EventRouterBuilder {
        EventRouterBuilder {
            context,
            publisher,
            states: HashMap::new(),
        }
    }

    /// Process one inbound envelope.
    pub async fn process_event(&self, input: &Envelope) -> Result<(), RelayError> {
        info!(
            event_id = %input.id(),
            trace_id = %input.trace_id(),
            target = %input.target_state(),
            ttl = input.ttl(),
            "processing event"
        );

        if input.ttl() == 0 {
            info!(event_id = %input.id(), "event expired, ignoring");
            return Ok(());
        }

        let Some(state) = self.states.get(input.target_state()) else {
            info!(
                event_id = %input.id(),
                target = %input.target_state(),
                "no state defined, ignoring"
            );
            return Ok(());
        };

        let outputs = match state.handle(&self.context, input).await {
            Ok(outputs) => outputs,
            Err(e) => {
                error!(event_id = %input.id(), error = %e, "state failed");
                return Err(RelayError::StateFailed(input.id()));
            }
        };

        if outputs.is_empty() {
            info!(event_id = %input.id(), "no output events produced");
            return Ok(());
        }

        for output in outputs {
            let event = Envelope::next_hop(input, output);
            let event_id = event.id();
            info!(
                event_id = %event_id,
                target = %event.target_state(),
                "producing event"
            );
            if let Err(e) = self.publisher.publish(event).await {
                error!(event_id = %event_id, error = %e, "failed to produce event");
                return Err(RelayError::PublishFailed(event_id));
            }
        }

        info!(event_id = %input.id(), "successfully processed");
        Ok(())
    }
}

/// Builds the immutable name-to-state registry.
///
/// Duplicate names are rejected here, at wiring time, not at dispatch time.
pub struct EventRouterBuilder {
    context: StateContext,
    publisher: Arc<dyn EventPublisher>,
    states: HashMap<StateName, State>,
}

impl EventRouterBuilder {
    pub fn with_state(mut self, state: State) -> Result<Self, RelayError> {
        let name = state.name().clone();
        if self.states.contains_key(&name) {
            return Err(RelayError::DuplicateState(name));
        }
        self.states.insert(name, state);
        Ok(self)
    }

    pub fn build(self) -> EventRouter {
        EventRouter {
            context: self.context,
            publisher: self.publisher,
            states: self.states,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::domain::Attributes;
    use crate::impls::{InMemoryObjectStorage, InMemoryStateTable};
    use crate::state::ExecutionRunner;

    struct RecordingPublisher {
        published: Mutex<Vec<Envelope>>,
        /// Publishes left before failing; u32::MAX means never fail.
        remaining_successes: AtomicU32,
    }

    impl RecordingPublisher {
        fn new() -> Arc<Self> {
            Self::failing_after(u32::MAX)
        }

        fn failing_after(n: u32) -> Arc<Self> {
            Arc::new(Self {
                published: Mutex::new(Vec::new()),
                remaining_successes: AtomicU32::new(n),
            })
        }

        async fn published(&self) -> Vec<Envelope> {
            self.published.lock().await.clone()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish_delayed(
            &self,
            event: Envelope,
            _delay: std::time::Duration,
        ) -> Result<(), RelayError> {
            if self.remaining_successes.load(Ordering::Relaxed) == 0 {
                return Err(RelayError::Other("publisher down".to_string()));
            }
            self.remaining_successes.fetch_sub(1, Ordering::Relaxed);
            self.published.lock().await.push(event);
            Ok(())
        }
    }

    struct CountingRunner {
        calls: AtomicU32,
    }

    impl CountingRunner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ExecutionRunner for CountingRunner {
        async fn run(&self, _ctx: &StateContext) -> Result<(), RelayError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl ExecutionRunner for FailingRunner {
        async fn run(&self, _ctx: &StateContext) -> Result<(), RelayError> {
            Err(RelayError::Other("boom".to_string()))
        }
    }

    fn test_context() -> StateContext {
        StateContext::new(
            Arc::new(InMemoryObjectStorage::new()),
            Arc::new(InMemoryStateTable::new()),
        )
    }

    #[test]
    fn builder_rejects_duplicate_state_names() {
        let publisher = RecordingPublisher::new();
        let err = EventRouter::builder(test_context(), publisher)
            .with_state(State::fork("test", vec![StateName::new("a")]).unwrap())
            .unwrap()
            .with_state(State::fork("test", vec![StateName::new("b")]).unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, RelayError::DuplicateState(_)));
    }

    #[tokio::test]
    async fn expired_event_is_dropped_without_invoking_the_state() {
        let publisher = RecordingPublisher::new();
        let runner = CountingRunner::new();
        let router = EventRouter::builder(test_context(), publisher.clone())
            .with_state(State::execution("test", "target", runner.clone()))
            .unwrap()
            .build();

        let input = Envelope::genesis(0, StateName::new("test"), Attributes::new());
        router.process_event(&input).await.unwrap();

        assert_eq!(runner.calls.load(Ordering::Relaxed), 0);
        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn unroutable_event_is_dropped_without_error() {
        let publisher = RecordingPublisher::new();
        let router = EventRouter::builder(test_context(), publisher.clone()).build();

        let input = Envelope::genesis(5, StateName::new("missing"), Attributes::new());
        router.process_event(&input).await.unwrap();

        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn handled_event_is_completed_and_published() {
        let publisher = RecordingPublisher::new();
        let router = EventRouter::builder(test_context(), publisher.clone())
            .with_state(State::execution("test", "target", CountingRunner::new()))
            .unwrap()
            .build();

        let attributes = Attributes::from([("k".to_string(), "v".to_string())]);
        let input = Envelope::genesis(5, StateName::new("test"), attributes.clone());
        router.process_event(&input).await.unwrap();

        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        let event = &published[0];
        assert_ne!(event.id(), input.id());
        assert_eq!(event.trace_id(), input.trace_id());
        assert_eq!(event.ttl(), 4);
        assert_eq!(event.source_state().as_str(), "test");
        assert_eq!(event.target_state().as_str(), "target");
        assert_eq!(event.attributes(), &attributes);
    }

    #[tokio::test]
    async fn handler_failure_is_wrapped_and_nothing_is_published() {
        let publisher = RecordingPublisher::new();
        let router = EventRouter::builder(test_context(), publisher.clone())
            .with_state(State::execution("test", "target", Arc::new(FailingRunner)))
            .unwrap()
            .build();

        let input = Envelope::genesis(5, StateName::new("test"), Attributes::new());
        let err = router.process_event(&input).await.unwrap_err();

        assert!(matches!(err, RelayError::StateFailed(id) if id == input.id()));
        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn publish_failure_aborts_but_keeps_earlier_publishes() {
        // Fork to three targets with a publisher that fails on the second
        // publish: the first envelope stays published, the third is never
        // attempted.
        let publisher = RecordingPublisher::failing_after(1);
        let router = EventRouter::builder(test_context(), publisher.clone())
            .with_state(
                State::fork(
                    "test",
                    vec![StateName::new("a"), StateName::new("b"), StateName::new("c")],
                )
                .unwrap(),
            )
            .unwrap()
            .build();

        let input = Envelope::genesis(5, StateName::new("test"), Attributes::new());
        let err = router.process_event(&input).await.unwrap_err();

        assert!(matches!(err, RelayError::PublishFailed(_)));
        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].target_state().as_str(), "a");
    }
}
