use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::profile::{Profile, Viewer};
use crate::infra::store::{NotificationRecord, NotificationStore, ProfileStore};

/// In-process store for local runs and tests. Rows live for the lifetime of
/// the process.
#[derive(Default)]
pub struct MemoryStore {
    notifications: RwLock<Vec<Notification>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_profile(&self, profile: Profile) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| anyhow!("profile table lock poisoned"))?;
        profiles.insert(profile.user_id, profile);
        Ok(())
    }

    /// Insert a fully-formed row, keeping its id, read flag and timestamp.
    pub fn seed(&self, notification: Notification) -> Result<()> {
        let mut notifications = self
            .notifications
            .write()
            .map_err(|_| anyhow!("notification table lock poisoned"))?;
        notifications.push(notification);
        Ok(())
    }

    pub fn get(&self, notification_id: Uuid) -> Result<Option<Notification>> {
        let notifications = self
            .notifications
            .read()
            .map_err(|_| anyhow!("notification table lock poisoned"))?;
        Ok(notifications
            .iter()
            .find(|notification| notification.id == notification_id)
            .cloned())
    }

    fn sender_name(&self, sender_id: Option<Uuid>) -> Result<Option<String>> {
        let Some(sender_id) = sender_id else {
            return Ok(None);
        };
        let profiles = self
            .profiles
            .read()
            .map_err(|_| anyhow!("profile table lock poisoned"))?;
        Ok(profiles
            .get(&sender_id)
            .map(|profile| profile.full_name.clone()))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn recent_for(&self, viewer: &Viewer, limit: i64) -> Result<Vec<NotificationRecord>> {
        let mut visible: Vec<Notification> = {
            let notifications = self
                .notifications
                .read()
                .map_err(|_| anyhow!("notification table lock poisoned"))?;
            notifications
                .iter()
                .rev()
                .filter(|notification| notification.is_visible_to(viewer))
                .cloned()
                .collect()
        };
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible.truncate(usize::try_from(limit).unwrap_or(0));

        let mut records = Vec::with_capacity(visible.len());
        for notification in visible {
            records.push(NotificationRecord {
                sender_name: self.sender_name(notification.sender_id)?,
                notification,
            });
        }
        Ok(records)
    }

    async fn count_unread_for(&self, viewer: &Viewer) -> Result<i64> {
        let notifications = self
            .notifications
            .read()
            .map_err(|_| anyhow!("notification table lock poisoned"))?;
        let count = notifications
            .iter()
            .filter(|notification| notification.is_visible_to(viewer) && !notification.is_read)
            .count();
        Ok(count as i64)
    }

    async fn insert(&self, new: &NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            recipient: new.recipient,
            title: new.title.clone(),
            message: new.message.clone(),
            category: new.category,
            is_read: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.seed(notification.clone())?;
        Ok(notification)
    }

    async fn mark_read(&self, notification_id: Uuid, viewer: &Viewer) -> Result<bool> {
        let mut notifications = self
            .notifications
            .write()
            .map_err(|_| anyhow!("notification table lock poisoned"))?;
        match notifications
            .iter_mut()
            .find(|notification| notification.id == notification_id && notification.is_visible_to(viewer))
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| anyhow!("profile table lock poisoned"))?;
        Ok(profiles.get(&user_id).cloned())
    }

    async fn profiles_except(&self, user_id: Uuid) -> Result<Vec<Profile>> {
        let mut others: Vec<Profile> = {
            let profiles = self
                .profiles
                .read()
                .map_err(|_| anyhow!("profile table lock poisoned"))?;
            profiles
                .values()
                .filter(|profile| profile.user_id != user_id)
                .cloned()
                .collect()
        };
        others.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(others)
    }
}
