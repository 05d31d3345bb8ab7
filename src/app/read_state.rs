use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::app::delivery::InboxEntry;
use crate::app::error::NotifyError;
use crate::app::events::{EventBus, PortalEvent};
use crate::domain::profile::Viewer;
use crate::infra::store::NotificationStore;

/// Loaded notifications for one viewer and their read flags.
///
/// `unread_count` only reflects the loaded page. The server-side total is
/// available from `DeliveryResolver::unread_total`.
pub struct ReadStateTracker {
    store: Arc<dyn NotificationStore>,
    events: EventBus,
    viewer: Viewer,
    timeout: Duration,
    entries: Vec<InboxEntry>,
}

impl ReadStateTracker {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        events: EventBus,
        viewer: Viewer,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            events,
            viewer,
            timeout,
            entries: Vec::new(),
        }
    }

    pub fn replace(&mut self, entries: Vec<InboxEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[InboxEntry] {
        &self.entries
    }

    pub fn unread_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.notification.is_read)
            .count()
    }

    /// Flips the flag locally right away and persists it in the background.
    /// Returns the persistence task when a write was dispatched; `None` when
    /// the entry is already read or not loaded. A failed write is logged and
    /// the local flag stays set.
    ///
    /// The write is spawned on the current Tokio runtime. Called outside one,
    /// the flag is still flipped locally, nothing is persisted, and `None` is
    /// returned.
    pub fn mark_read(&mut self, notification_id: Uuid) -> Option<JoinHandle<()>> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.notification.id == notification_id)?;
        if entry.notification.is_read {
            return None;
        }
        entry.notification.is_read = true;

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(notification_id = %notification_id, "no async runtime; read flag not persisted");
                return None;
            }
        };
        let store = self.store.clone();
        let events = self.events.clone();
        let viewer = self.viewer;
        let timeout = self.timeout;
        Some(runtime.spawn(async move {
            if let Err(err) =
                persist_read(store.as_ref(), &events, notification_id, &viewer, timeout).await
            {
                tracing::warn!(error = %err, notification_id = %notification_id, "read flag not persisted");
            }
        }))
    }

    /// Applies a read that happened elsewhere without touching the store.
    pub fn apply_remote_read(&mut self, notification_id: Uuid) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.notification.id == notification_id)
        {
            Some(entry) if !entry.notification.is_read => {
                entry.notification.is_read = true;
                true
            }
            _ => false,
        }
    }
}

/// Sets the read flag in the store for a notification visible to the viewer
/// and announces it on the bus.
pub async fn persist_read(
    store: &dyn NotificationStore,
    events: &EventBus,
    notification_id: Uuid,
    viewer: &Viewer,
    timeout: Duration,
) -> Result<(), NotifyError> {
    let updated = tokio::time::timeout(timeout, store.mark_read(notification_id, viewer))
        .await
        .map_err(|_| {
            tracing::error!(notification_id = %notification_id, user_id = %viewer.user_id, "mark read timed out");
            NotifyError::Write("failed to mark notification read")
        })?
        .map_err(|err| {
            tracing::error!(error = ?err, notification_id = %notification_id, user_id = %viewer.user_id, "failed to mark notification read");
            NotifyError::Write("failed to mark notification read")
        })?;

    if !updated {
        return Err(NotifyError::NotFound);
    }

    events.publish(PortalEvent::NotificationRead {
        id: notification_id,
    });
    Ok(())
}
