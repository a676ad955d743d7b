//! Mock notifier that records every event for test assertions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{DirectEvent, EngineEvent};
use crate::roster::ParticipantId;
use crate::traits::Notifier;

/// Mock notifier for asserting on engine output.
///
/// Clones share the recorded event log, so a test can hand one clone to
/// the engine and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    broadcasts: Arc<RwLock<Vec<EngineEvent>>>,
    unicasts: Arc<RwLock<Vec<(ParticipantId, DirectEvent)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All broadcast events, in delivery order.
    pub async fn broadcasts(&self) -> Vec<EngineEvent> {
        self.broadcasts.read().await.clone()
    }

    /// All unicast events, in delivery order.
    pub async fn unicasts(&self) -> Vec<(ParticipantId, DirectEvent)> {
        self.unicasts.read().await.clone()
    }

    /// Unicast events delivered to one participant.
    pub async fn sent_to(&self, id: ParticipantId) -> Vec<DirectEvent> {
        self.unicasts
            .read()
            .await
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// The most recent broadcast, if any.
    pub async fn last_broadcast(&self) -> Option<EngineEvent> {
        self.broadcasts.read().await.last().cloned()
    }

    /// Drop everything recorded so far.
    pub async fn clear(&self) {
        self.broadcasts.write().await.clear();
        self.unicasts.write().await.clear();
    }

    pub async fn broadcast_count(&self) -> usize {
        self.broadcasts.read().await.len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn broadcast(&self, event: EngineEvent) {
        self.broadcasts.write().await.push(event);
    }

    async fn unicast(&self, to: ParticipantId, event: DirectEvent) {
        self.unicasts.write().await.push((to, event));
    }
}
