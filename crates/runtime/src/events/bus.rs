//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use tactics_core::Notification;

use crate::replication::FieldUpdate;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Writes to replicated fields, each carrying a per-field version
    State,
    /// Fire-and-forget cues (attacks, hits, deaths, turn changes)
    Notification,
}

/// Event wrapper that carries the topic and typed payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    State(FieldUpdate),
    Notification(Notification),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::State(_) => Topic::State,
            Event::Notification(_) => Topic::Notification,
        }
    }
}

/// Topic-based event bus
///
/// Each topic is an independent broadcast channel. Delivery within a topic
/// preserves publish order; subscribers that fall behind observe `Lagged` and
/// are expected to resync from a snapshot.
#[derive(Clone)]
pub struct EventBus {
    state_tx: broadcast::Sender<Event>,
    notification_tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state_tx: broadcast::channel(capacity).0,
            notification_tx: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::State => &self.state_tx,
            Topic::Notification => &self.notification_tx,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
