use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app::delivery::{DeliveryResolver, FeedView, InboxEntry};
use crate::app::error::NotifyError;
use crate::app::events::{EventBus, PortalEvent};
use crate::app::presentation::{present, DisplayNotification};
use crate::app::read_state::ReadStateTracker;
use crate::domain::profile::Viewer;

/// One open notification list (badge or inbox) for a viewer.
///
/// Fetches are bound to the session's cancellation token: once the session is
/// closed an in-flight refresh resolves to `NotifyError::Cancelled` and the
/// loaded list is left alone.
pub struct InboxSession {
    resolver: DeliveryResolver,
    tracker: ReadStateTracker,
    viewer: Viewer,
    view: FeedView,
    cancel: CancellationToken,
    stale: bool,
}

impl InboxSession {
    pub fn open(resolver: DeliveryResolver, events: EventBus, viewer: Viewer, view: FeedView) -> Self {
        let tracker = ReadStateTracker::new(resolver.store(), events, viewer, resolver.timeout());
        Self {
            resolver,
            tracker,
            viewer,
            view,
            cancel: CancellationToken::new(),
            stale: true,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn view(&self) -> FeedView {
        self.view
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True until the first successful refresh, and again whenever a new
    /// notification addressed to this viewer is announced.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Reloads the list. On failure the previously loaded entries stay as
    /// they were.
    pub async fn refresh(&mut self) -> Result<usize, NotifyError> {
        if self.cancel.is_cancelled() {
            return Err(NotifyError::Cancelled);
        }

        let entries = tokio::select! {
            _ = self.cancel.cancelled() => return Err(NotifyError::Cancelled),
            result = self.resolver.resolve(&self.viewer, self.view) => result?,
        };

        let loaded = entries.len();
        self.tracker.replace(entries);
        self.stale = false;
        Ok(loaded)
    }

    pub fn entries(&self) -> &[InboxEntry] {
        self.tracker.entries()
    }

    pub fn unread_count(&self) -> usize {
        self.tracker.unread_count()
    }

    pub fn mark_read(&mut self, notification_id: Uuid) -> Option<JoinHandle<()>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.tracker.mark_read(notification_id)
    }

    /// Folds a bus event into the session. Returns true when the session
    /// changed.
    pub fn apply_event(&mut self, event: &PortalEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        match event {
            PortalEvent::NotificationRead { id } => self.tracker.apply_remote_read(*id),
            PortalEvent::NotificationSent { recipient, .. } => {
                if recipient.includes(&self.viewer) {
                    self.stale = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn display(&self, now: OffsetDateTime) -> Vec<DisplayNotification> {
        self.entries()
            .iter()
            .map(|entry| present(entry, now))
            .collect()
    }
}
