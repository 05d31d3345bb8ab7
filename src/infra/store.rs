use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::profile::{Profile, Viewer};

/// A stored notification with the sender's display name joined in, when the
/// sender has a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub notification: Notification,
    pub sender_name: Option<String>,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Newest-first notifications addressed to the viewer or the viewer's role.
    async fn recent_for(&self, viewer: &Viewer, limit: i64) -> Result<Vec<NotificationRecord>>;

    async fn count_unread_for(&self, viewer: &Viewer) -> Result<i64>;

    async fn insert(&self, new: &NewNotification) -> Result<Notification>;

    /// Sets the read flag on a notification visible to the viewer. Returns
    /// false when no such notification exists.
    async fn mark_read(&self, notification_id: Uuid, viewer: &Viewer) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>>;

    async fn profiles_except(&self, user_id: Uuid) -> Result<Vec<Profile>>;
}
