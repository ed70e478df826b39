//! Local drive loop: pop and route until the queue drains.

use std::sync::Arc;

use tracing::info;

use crate::domain::Envelope;
use crate::error::RelayError;
use crate::impls::InMemoryEventQueue;
use crate::ports::EventPublisher;
use crate::router::EventRouter;

/// Runs a whole workflow in-process.
///
/// There is no scheduler here: the "scheduler" is the queue plus the
/// router's state lookup. The loop publishes the genesis event and then
/// routes one event at a time until nothing is left, which is exactly what
/// an external delivery mechanism would do, minus the concurrency.
pub struct LocalRunner {
    router: EventRouter,
    queue: Arc<InMemoryEventQueue>,
}

impl LocalRunner {
    /// `queue` must be the same publisher the router was built with,
    /// otherwise produced events are never drained.
    pub fn new(router: EventRouter, queue: Arc<InMemoryEventQueue>) -> Self {
        Self { router, queue }
    }

    /// Publish `genesis` and process events until the queue is empty.
    pub async fn run(&self, genesis: Envelope) -> Result<(), RelayError> {
        info!(event_id = %genesis.id(), "starting run");
        self.queue.publish(genesis).await?;

        while let Some(event) = self.queue.pop().await {
            self.router.process_event(&event).await?;
        }

        info!("run complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{Attributes, StateName};
    use crate::impls::{InMemoryObjectStorage, InMemoryStateTable};
    use crate::ports::ObjectStorage;
    use crate::state::{ExecutionRunner, State, StateContext};

    const STORAGE: &str = "example";

    struct CreateGreeting;

    #[async_trait]
    impl ExecutionRunner for CreateGreeting {
        async fn run(&self, ctx: &StateContext) -> Result<(), RelayError> {
            ctx.object_storage()
                .put_string(STORAGE, "hello.txt", "Hello")
                .await
        }
    }

    struct GreetRecipient {
        name: &'static str,
        path: &'static str,
    }

    #[async_trait]
    impl ExecutionRunner for GreetRecipient {
        async fn run(&self, ctx: &StateContext) -> Result<(), RelayError> {
            let hello = ctx.object_storage().get_string(STORAGE, "hello.txt").await?;
            ctx.object_storage()
                .put_string(STORAGE, self.path, &format!("{hello} {}", self.name))
                .await
        }
    }

    struct CollectGreetings;

    #[async_trait]
    impl ExecutionRunner for CollectGreetings {
        async fn run(&self, ctx: &StateContext) -> Result<(), RelayError> {
            let storage = ctx.object_storage();
            let john = storage.get_string(STORAGE, "john.txt").await?;
            let alice = storage.get_string(STORAGE, "alice.txt").await?;
            let amy = storage.get_string(STORAGE, "amy.txt").await?;
            storage
                .put_string(STORAGE, "hi_all.txt", &format!("{john}\n{alice}\n{amy}"))
                .await
        }
    }

    /// Genesis -> execution -> fork into three branches (one passing
    /// through a one-second wait) -> join -> final execution concatenating
    /// the per-recipient greetings.
    #[tokio::test(start_paused = true)]
    async fn greeting_pipeline_runs_end_to_end() {
        let storage = Arc::new(InMemoryObjectStorage::new());
        let table = Arc::new(InMemoryStateTable::new());
        let queue = Arc::new(InMemoryEventQueue::new());
        let context = StateContext::new(storage.clone(), table.clone());

        let router = EventRouter::builder(context, queue.clone())
            .with_state(State::execution(
                "hello:input",
                "hello:output",
                Arc::new(CreateGreeting),
            ))
            .unwrap()
            .with_state(
                State::fork(
                    "hello:output",
                    vec![
                        StateName::new("john"),
                        StateName::new("alice"),
                        StateName::new("amy"),
                    ],
                )
                .unwrap(),
            )
            .unwrap()
            .with_state(State::execution(
                "john",
                "john:wait",
                Arc::new(GreetRecipient {
                    name: "John",
                    path: "john.txt",
                }),
            ))
            .unwrap()
            .with_state(State::wait("john:wait", "hi_all:join", 1).unwrap())
            .unwrap()
            .with_state(State::execution(
                "alice",
                "hi_all:join",
                Arc::new(GreetRecipient {
                    name: "Alice",
                    path: "alice.txt",
                }),
            ))
            .unwrap()
            .with_state(State::execution(
                "amy",
                "hi_all:join",
                Arc::new(GreetRecipient {
                    name: "Amy",
                    path: "amy.txt",
                }),
            ))
            .unwrap()
            .with_state(State::join(
                "hi_all:join",
                BTreeSet::from([
                    StateName::new("john:wait"),
                    StateName::new("alice"),
                    StateName::new("amy"),
                ]),
                "hi_all",
            ))
            .unwrap()
            .with_state(State::execution("hi_all", "end", Arc::new(CollectGreetings)))
            .unwrap()
            .build();

        let runner = LocalRunner::new(router, queue.clone());
        let genesis = Envelope::genesis(10, StateName::new("hello:input"), Attributes::new());
        runner.run(genesis).await.unwrap();

        let result = storage.get_string(STORAGE, "hi_all.txt").await.unwrap();
        assert_eq!(result, "Hello John\nHello Alice\nHello Amy");

        // The join accumulator was consumed and nothing is left in flight.
        assert!(table.is_empty().await);
        assert!(queue.is_empty().await);
    }

    /// A cyclic graph terminates once the hop budget is spent.
    #[tokio::test]
    async fn cycles_self_terminate_on_ttl_exhaustion() {
        let queue = Arc::new(InMemoryEventQueue::new());
        let context = StateContext::new(
            Arc::new(InMemoryObjectStorage::new()),
            Arc::new(InMemoryStateTable::new()),
        );

        let router = EventRouter::builder(context, queue.clone())
            .with_state(State::fork("loop", vec![StateName::new("loop")]).unwrap())
            .unwrap()
            .build();

        let runner = LocalRunner::new(router, queue.clone());
        let genesis = Envelope::genesis(5, StateName::new("loop"), Attributes::new());
        runner.run(genesis).await.unwrap();

        assert!(queue.is_empty().await);
    }
}
