use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::app::error::NotifyError;
use crate::domain::notification::Notification;
use crate::domain::profile::Viewer;
use crate::infra::store::{NotificationRecord, NotificationStore};

/// Label shown when a notification has no sender profile.
pub const SYSTEM_SENDER: &str = "System";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedView {
    /// Passive unread badge.
    Badge,
    #[default]
    Inbox,
}

impl FeedView {
    pub fn limit(&self) -> i64 {
        match self {
            FeedView::Badge => 10,
            FeedView::Inbox => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub notification: Notification,
    pub sender_name: String,
}

impl From<NotificationRecord> for InboxEntry {
    fn from(record: NotificationRecord) -> Self {
        Self {
            notification: record.notification,
            sender_name: record
                .sender_name
                .unwrap_or_else(|| SYSTEM_SENDER.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct DeliveryResolver {
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl DeliveryResolver {
    pub fn new(store: Arc<dyn NotificationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> Arc<dyn NotificationStore> {
        self.store.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Most recent notifications addressed to the viewer directly or to the
    /// viewer's role, newest first.
    pub async fn resolve(&self, viewer: &Viewer, view: FeedView) -> Result<Vec<InboxEntry>, NotifyError> {
        let records = tokio::time::timeout(self.timeout, self.store.recent_for(viewer, view.limit()))
            .await
            .map_err(|_| {
                tracing::error!(user_id = %viewer.user_id, timeout = ?self.timeout, "notification fetch timed out");
                NotifyError::Fetch
            })?
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = %viewer.user_id, "failed to fetch notifications");
                NotifyError::Fetch
            })?;

        let mut entries: Vec<InboxEntry> = records
            .into_iter()
            .filter(|record| record.notification.is_visible_to(viewer))
            .map(InboxEntry::from)
            .collect();
        entries.sort_by(|a, b| b.notification.created_at.cmp(&a.notification.created_at));
        entries.truncate(view.limit() as usize);

        Ok(entries)
    }

    /// Unread total across everything addressed to the viewer, not just the
    /// loaded page.
    pub async fn unread_total(&self, viewer: &Viewer) -> Result<i64, NotifyError> {
        tokio::time::timeout(self.timeout, self.store.count_unread_for(viewer))
            .await
            .map_err(|_| {
                tracing::error!(user_id = %viewer.user_id, timeout = ?self.timeout, "unread count timed out");
                NotifyError::Fetch
            })?
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = %viewer.user_id, "failed to count unread notifications");
                NotifyError::Fetch
            })
    }
}
