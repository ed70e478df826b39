//! Local demo of the relay engine.
//!
//! Wires the greeting pipeline (execution -> fork -> three branches, one
//! with a wait -> join -> final execution) against filesystem storage under
//! `./temp` and runs it to completion on the in-process queue.
//!
//! Usage: `relay-cli [event.json]` — the optional argument is a genesis
//! event in the wire JSON shape; without it a default genesis event
//! targeting `hello:input` with ttl 10 is used.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::impls::{InMemoryEventQueue, InMemoryStateTable, LocalObjectStorage, LocalRunner};
use relay_core::{
    Attributes, Envelope, EventRouter, ExecutionRunner, ObjectStorage, RelayError, State,
    StateContext, StateName,
};
use tracing_subscriber::EnvFilter;

const STORAGE: &str = "example";

const PATH_HELLO: &str = "hello.txt";
const PATH_JOHN: &str = "john.txt";
const PATH_ALICE: &str = "alice.txt";
const PATH_AMY: &str = "amy.txt";
const PATH_HI_ALL: &str = "hi_all.txt";

struct CreateGreeting;

#[async_trait]
impl ExecutionRunner for CreateGreeting {
    async fn run(&self, ctx: &StateContext) -> Result<(), RelayError> {
        ctx.object_storage()
            .put_string(STORAGE, PATH_HELLO, "Hello")
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
        let hello = ctx.object_storage().get_string(STORAGE, PATH_HELLO).await?;
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
        let john = storage.get_string(STORAGE, PATH_JOHN).await?;
        let alice = storage.get_string(STORAGE, PATH_ALICE).await?;
        let amy = storage.get_string(STORAGE, PATH_AMY).await?;
        storage
            .put_string(STORAGE, PATH_HI_ALL, &format!("{john}\n{alice}\n{amy}"))
            .await
    }
}

/// Wire the demo state graph against the given collaborators.
fn build_router(
    context: StateContext,
    publisher: Arc<InMemoryEventQueue>,
) -> Result<EventRouter, RelayError> {
    Ok(EventRouter::builder(context, publisher)
        .with_state(State::execution(
            "hello:input",
            "hello:output",
            Arc::new(CreateGreeting),
        ))?
        .with_state(State::fork(
            "hello:output",
            vec![
                StateName::new("john"),
                StateName::new("alice"),
                StateName::new("amy"),
            ],
        )?)?
        .with_state(State::execution(
            "john",
            "john:wait",
            Arc::new(GreetRecipient {
                name: "John",
                path: PATH_JOHN,
            }),
        ))?
        .with_state(State::wait("john:wait", "hi_all:join", 1)?)?
        .with_state(State::execution(
            "alice",
            "hi_all:join",
            Arc::new(GreetRecipient {
                name: "Alice",
                path: PATH_ALICE,
            }),
        ))?
        .with_state(State::execution(
            "amy",
            "hi_all:join",
            Arc::new(GreetRecipient {
                name: "Amy",
                path: PATH_AMY,
            }),
        ))?
        .with_state(State::join(
            "hi_all:join",
            BTreeSet::from([
                StateName::new("john:wait"),
                StateName::new("alice"),
                StateName::new("amy"),
            ]),
            "hi_all",
        ))?
        // The final state routes to "end", which has no registered state,
        // so the run stops there.
        .with_state(State::execution("hi_all", "end", Arc::new(CollectGreetings)))?
        .build())
}

fn load_genesis(path: &str) -> Result<Envelope, RelayError> {
    let bytes = std::fs::read(path)
        .map_err(|e| RelayError::Other(format!("cannot load event file {path}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| RelayError::Other(format!("cannot parse event file {path}: {e}")))
}

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let genesis = match std::env::args().nth(1) {
        Some(path) => load_genesis(&path)?,
        None => Envelope::genesis(10, StateName::new("hello:input"), Attributes::new()),
    };

    let storage_root = PathBuf::from("temp");
    std::fs::create_dir_all(&storage_root)
        .map_err(|e| RelayError::Storage(format!("cannot create storage root: {e}")))?;

    let storage = Arc::new(LocalObjectStorage::new(storage_root)?);
    let table = Arc::new(InMemoryStateTable::new());
    let queue = Arc::new(InMemoryEventQueue::new());
    let context = StateContext::new(storage.clone(), table);

    let router = build_router(context, queue.clone())?;
    LocalRunner::new(router, queue).run(genesis).await?;

    let result = storage.get_string(STORAGE, PATH_HI_ALL).await?;
    println!("{result}");

    Ok(())
}
