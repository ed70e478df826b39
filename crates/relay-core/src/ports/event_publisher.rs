//! EventPublisher port - hands completed envelopes back to the channel.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Envelope, WAIT_SECONDS_ATTRIBUTE};
use crate::error::RelayError;

/// Publisher for produced events.
///
/// Implementations realize delayed delivery however the underlying channel
/// supports it (delayed-delivery queue, in-process sleep, ...). The wait
/// state itself never blocks; the delay hint travels as a reserved
/// attribute and is consumed here.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`, honoring the reserved delay attribute.
    ///
    /// If [`WAIT_SECONDS_ATTRIBUTE`] is present, the event must stay
    /// invisible for that many seconds and the attribute is stripped before
    /// publishing. A negative or unparseable value fails fast.
    async fn publish(&self, event: Envelope) -> Result<(), RelayError> {
        let delay = delay_hint(&event)?;
        let event = event.without_attribute(WAIT_SECONDS_ATTRIBUTE);
        self.publish_delayed(event, delay).await
    }

    /// Publish `event` after `delay`.
    async fn publish_delayed(&self, event: Envelope, delay: Duration) -> Result<(), RelayError>;
}

/// Extract the delay hint from an envelope's attributes.
///
/// Absent attribute means no delay.
pub fn delay_hint(event: &Envelope) -> Result<Duration, RelayError> {
    let Some(raw) = event.attributes().get(WAIT_SECONDS_ATTRIBUTE) else {
        return Ok(Duration::ZERO);
    };

    let seconds: i64 = raw
        .parse()
        .map_err(|_| RelayError::InvalidDelay(raw.clone()))?;
    if seconds < 0 {
        return Err(RelayError::NegativeDelay(seconds));
    }

    Ok(Duration::from_secs(seconds as u64))
}
