//! In-process event queue doubling as the publisher for local runs.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::Envelope;
use crate::error::RelayError;
use crate::ports::EventPublisher;

/// FIFO queue that implements [`EventPublisher`].
///
/// Delay hints are realized by sleeping before the event is enqueued, which
/// mirrors a delayed-delivery channel closely enough for local runs: the
/// event is simply not visible until the delay has passed. Under
/// `tokio::time::pause` the sleep auto-advances, so waits cost nothing in
/// tests.
#[derive(Default)]
pub struct InMemoryEventQueue {
    queue: Mutex<VecDeque<Envelope>>,
}

impl InMemoryEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next visible event, if any.
    pub async fn pop(&self) -> Option<Envelope> {
        self.queue.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventQueue {
    async fn publish_delayed(&self, event: Envelope, delay: Duration) -> Result<(), RelayError> {
        if !delay.is_zero() {
            info!(
                event_id = %event.id(),
                delay_secs = delay.as_secs(),
                "delaying event delivery"
            );
            tokio::time::sleep(delay).await;
        }
        self.queue.lock().await.push_back(event);
        Ok(())
    }
}
