use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::notification::Recipient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    NotificationSent { id: Uuid, recipient: Recipient },
    NotificationRead { id: Uuid },
}

/// Typed fan-out between the services and any open inbox sessions.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PortalEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: PortalEvent) {
        // No open subscribers is the normal idle state.
        if let Err(err) = self.sender.send(event) {
            tracing::debug!(event = ?err.0, "portal event had no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.sender.subscribe()
    }
}
