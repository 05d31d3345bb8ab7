use anyhow::{anyhow, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::profile::{Role, Viewer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    #[default]
    General,
    Assignment,
    Attendance,
    Announcement,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::General => "general",
            NotificationCategory::Assignment => "assignment",
            NotificationCategory::Attendance => "attendance",
            NotificationCategory::Announcement => "announcement",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "general" => Ok(NotificationCategory::General),
            "assignment" => Ok(NotificationCategory::Assignment),
            "attendance" => Ok(NotificationCategory::Attendance),
            "announcement" => Ok(NotificationCategory::Announcement),
            other => Err(anyhow!("unknown notification type: {}", other)),
        }
    }
}

/// Addressing mode: exactly one person or one whole role cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    User(Uuid),
    Role(Role),
}

impl Recipient {
    /// Build from the two nullable storage columns. Exactly one must be set.
    pub fn from_columns(recipient_id: Option<Uuid>, recipient_role: Option<Role>) -> Result<Self> {
        match (recipient_id, recipient_role) {
            (Some(user_id), None) => Ok(Recipient::User(user_id)),
            (None, Some(role)) => Ok(Recipient::Role(role)),
            (Some(_), Some(_)) => Err(anyhow!("recipient_id and recipient_role are mutually exclusive")),
            (None, None) => Err(anyhow!("recipient_id or recipient_role is required")),
        }
    }

    pub fn recipient_id(&self) -> Option<Uuid> {
        match self {
            Recipient::User(user_id) => Some(*user_id),
            Recipient::Role(_) => None,
        }
    }

    pub fn recipient_role(&self) -> Option<Role> {
        match self {
            Recipient::User(_) => None,
            Recipient::Role(role) => Some(*role),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Recipient::Role(_))
    }

    pub fn includes(&self, viewer: &Viewer) -> bool {
        match self {
            Recipient::User(user_id) => *user_id == viewer.user_id,
            Recipient::Role(role) => *role == viewer.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Absent for system-generated notifications.
    pub sender_id: Option<Uuid>,
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Notification {
    pub fn is_visible_to(&self, viewer: &Viewer) -> bool {
        self.recipient.includes(viewer)
    }
}

/// A validated notification ready to be inserted. The store assigns id,
/// creation time and the initial unread state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub sender_id: Option<Uuid>,
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
}
