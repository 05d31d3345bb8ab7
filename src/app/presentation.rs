use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::delivery::InboxEntry;
use crate::domain::notification::NotificationCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationIcon {
    Document,
    People,
    Message,
    Bell,
}

impl NotificationIcon {
    pub fn for_category(category: NotificationCategory) -> Self {
        match category {
            NotificationCategory::Assignment => NotificationIcon::Document,
            NotificationCategory::Attendance => NotificationIcon::People,
            NotificationCategory::Announcement => NotificationIcon::Message,
            NotificationCategory::General => NotificationIcon::Bell,
        }
    }
}

/// Visual weight of the category badge in the inbox list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Default,
    Secondary,
    Destructive,
    Outline,
}

impl BadgeTone {
    pub fn for_category(category: NotificationCategory) -> Self {
        match category {
            NotificationCategory::Assignment => BadgeTone::Default,
            NotificationCategory::Attendance => BadgeTone::Secondary,
            NotificationCategory::Announcement => BadgeTone::Destructive,
            NotificationCategory::General => BadgeTone::Outline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayNotification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    pub icon: NotificationIcon,
    pub badge: BadgeTone,
    pub sender_name: String,
    pub is_read: bool,
    pub relative_time: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn present(entry: &InboxEntry, now: OffsetDateTime) -> DisplayNotification {
    let notification = &entry.notification;
    DisplayNotification {
        id: notification.id,
        title: notification.title.clone(),
        message: notification.message.clone(),
        category: notification.category,
        icon: NotificationIcon::for_category(notification.category),
        badge: BadgeTone::for_category(notification.category),
        sender_name: entry.sender_name.clone(),
        is_read: notification.is_read,
        relative_time: relative_time(notification.created_at, now),
        created_at: notification.created_at,
    }
}

/// Whole-hour buckets. Timestamps ahead of `now` count as "Just now".
pub fn relative_time(created_at: OffsetDateTime, now: OffsetDateTime) -> String {
    let hours = (now - created_at).whole_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else if hours < 48 {
        "1 day ago".to_string()
    } else {
        format!("{} days ago", hours / 24)
    }
}
