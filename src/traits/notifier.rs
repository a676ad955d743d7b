//! Notification abstraction for fanning engine events out to participants.

use async_trait::async_trait;

use crate::events::{DirectEvent, EngineEvent};
use crate::roster::ParticipantId;

/// Abstraction over event delivery.
///
/// Delivery is fire-and-forget: the engine never waits on, retries, or
/// observes transport failures. Implementations that can fail should log
/// and move on. This keeps every engine operation free of partial-state
/// outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an event to every connected participant.
    async fn broadcast(&self, event: EngineEvent);

    /// Deliver an event to a single participant.
    async fn unicast(&self, to: ParticipantId, event: DirectEvent);
}
