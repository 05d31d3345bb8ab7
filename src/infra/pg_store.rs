use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::notification::{NewNotification, Notification, Recipient};
use crate::domain::profile::{Profile, Role, Viewer};
use crate::infra::db::Db;
use crate::infra::store::{NotificationRecord, NotificationStore, ProfileStore};

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn recent_for(&self, viewer: &Viewer, limit: i64) -> Result<Vec<NotificationRecord>> {
        let rows = sqlx::query(
            "SELECT n.id, n.sender_id, n.recipient_id, n.recipient_role, n.title, n.message, \
                    n.type, n.is_read, n.created_at, p.full_name AS sender_name \
             FROM notifications n \
             LEFT JOIN profiles p ON p.user_id = n.sender_id \
             WHERE n.recipient_id = $1 OR n.recipient_role = $2 \
             ORDER BY n.created_at DESC, n.id DESC \
             LIMIT $3",
        )
        .bind(viewer.user_id)
        .bind(viewer.role.as_str())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(NotificationRecord {
                sender_name: row.try_get("sender_name")?,
                notification: notification_from_row(&row)?,
            });
        }

        Ok(records)
    }

    async fn count_unread_for(&self, viewer: &Viewer) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE (recipient_id = $1 OR recipient_role = $2) AND is_read = false",
        )
        .bind(viewer.user_id)
        .bind(viewer.role.as_str())
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn insert(&self, new: &NewNotification) -> Result<Notification> {
        let row = sqlx::query(
            "INSERT INTO notifications (sender_id, recipient_id, recipient_role, title, message, type) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, sender_id, recipient_id, recipient_role, title, message, type, is_read, created_at",
        )
        .bind(new.sender_id)
        .bind(new.recipient.recipient_id())
        .bind(new.recipient.recipient_role().map(|role| role.as_str()))
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.category.as_str())
        .fetch_one(self.db.pool())
        .await?;

        notification_from_row(&row)
    }

    async fn mark_read(&self, notification_id: Uuid, viewer: &Viewer) -> Result<bool> {
        // The flag only ever moves to true, so re-running the update is harmless.
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true \
             WHERE id = $1 AND (recipient_id = $2 OR recipient_role = $3)",
        )
        .bind(notification_id)
        .bind(viewer.user_id)
        .bind(viewer.role.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT user_id, full_name, role FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(|row| profile_from_row(&row)).transpose()
    }

    async fn profiles_except(&self, user_id: Uuid) -> Result<Vec<Profile>> {
        let rows = sqlx::query(
            "SELECT user_id, full_name, role FROM profiles \
             WHERE user_id <> $1 \
             ORDER BY full_name ASC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(profile_from_row).collect()
    }
}

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    let recipient_role: Option<String> = row.try_get("recipient_role")?;
    let recipient_role = recipient_role
        .map(|role| role.parse::<Role>())
        .transpose()?;
    let category: String = row.try_get("type")?;

    Ok(Notification {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        recipient: Recipient::from_columns(row.try_get("recipient_id")?, recipient_role)?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        category: category.parse()?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<Profile> {
    let role: String = row.try_get("role")?;
    Ok(Profile {
        user_id: row.try_get("user_id")?,
        full_name: row.try_get("full_name")?,
        role: role.parse()?,
    })
}
