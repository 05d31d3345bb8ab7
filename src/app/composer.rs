use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::app::error::NotifyError;
use crate::app::events::{EventBus, PortalEvent};
use crate::domain::notification::{NewNotification, Notification, NotificationCategory, Recipient};
use crate::domain::profile::{Profile, Role};
use crate::infra::store::{NotificationStore, ProfileStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub category: NotificationCategory,
    #[serde(default)]
    pub recipient_id: Option<Uuid>,
    #[serde(default)]
    pub recipient_role: Option<Role>,
}

impl NotificationDraft {
    /// All checks that need no store access, in the order a sender sees them.
    pub fn validate(&self, sender: &Profile) -> Result<NewNotification, NotifyError> {
        if !sender.role.can_compose() {
            return Err(NotifyError::Authorization(
                "only faculty and admins can send notifications".into(),
            ));
        }

        let title = self.title.trim();
        let message = self.message.trim();
        if title.is_empty() || message.is_empty() {
            return Err(NotifyError::Validation("title and message are required".into()));
        }

        let recipient = Recipient::from_columns(self.recipient_id, self.recipient_role)
            .map_err(|err| NotifyError::Validation(err.to_string()))?;

        if let Recipient::Role(role) = recipient {
            if !sender.role.can_broadcast_to(role) {
                return Err(NotifyError::Authorization(format!(
                    "{} senders cannot broadcast to {}",
                    sender.role, role
                )));
            }
        }

        Ok(NewNotification {
            sender_id: Some(sender.user_id),
            recipient,
            title: title.to_string(),
            message: message.to_string(),
            category: self.category,
        })
    }
}

/// Who a sender may address: individual people and broadcast roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOptions {
    pub people: Vec<Profile>,
    pub roles: Vec<Role>,
}

#[derive(Clone)]
pub struct Composer {
    store: Arc<dyn NotificationStore>,
    profiles: Arc<dyn ProfileStore>,
    events: EventBus,
    timeout: Duration,
}

impl Composer {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        profiles: Arc<dyn ProfileStore>,
        events: EventBus,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            profiles,
            events,
            timeout,
        }
    }

    pub async fn send(
        &self,
        sender: &Profile,
        draft: &NotificationDraft,
    ) -> Result<Notification, NotifyError> {
        let new = draft.validate(sender)?;

        let notification = tokio::time::timeout(self.timeout, self.store.insert(&new))
            .await
            .map_err(|_| {
                tracing::error!(sender_id = %sender.user_id, "notification insert timed out");
                NotifyError::Write("failed to send notification")
            })?
            .map_err(|err| {
                tracing::error!(error = ?err, sender_id = %sender.user_id, "failed to send notification");
                NotifyError::Write("failed to send notification")
            })?;

        tracing::info!(
            notification_id = %notification.id,
            sender_id = %sender.user_id,
            broadcast = notification.recipient.is_broadcast(),
            "notification sent"
        );
        self.events.publish(PortalEvent::NotificationSent {
            id: notification.id,
            recipient: notification.recipient,
        });

        Ok(notification)
    }

    pub async fn recipients(&self, sender: &Profile) -> Result<RecipientOptions, NotifyError> {
        if !sender.role.can_compose() {
            return Err(NotifyError::Authorization(
                "only faculty and admins can send notifications".into(),
            ));
        }

        let people = tokio::time::timeout(self.timeout, self.profiles.profiles_except(sender.user_id))
            .await
            .map_err(|_| {
                tracing::error!(user_id = %sender.user_id, "profile fetch timed out");
                NotifyError::Fetch
            })?
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = %sender.user_id, "failed to fetch profiles");
                NotifyError::Fetch
            })?;

        Ok(RecipientOptions {
            people,
            roles: sender.role.broadcast_targets().to_vec(),
        })
    }
}

/// Compose form state. Picking a role clears the person and the other way
/// round, so a submitted draft carries at most one target.
#[derive(Debug, Clone, Default)]
pub struct ComposeForm {
    draft: NotificationDraft,
}

impl ComposeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &NotificationDraft {
        &self.draft
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.draft.message = message.into();
    }

    pub fn set_category(&mut self, category: NotificationCategory) {
        self.draft.category = category;
    }

    pub fn target_role(&mut self, role: Role) {
        self.draft.recipient_role = Some(role);
        self.draft.recipient_id = None;
    }

    pub fn target_person(&mut self, user_id: Uuid) {
        self.draft.recipient_id = Some(user_id);
        self.draft.recipient_role = None;
    }

    /// Clears the form after a successful send; keeps every field otherwise.
    pub async fn submit(
        &mut self,
        composer: &Composer,
        sender: &Profile,
    ) -> Result<Notification, NotifyError> {
        let notification = composer.send(sender, &self.draft).await?;
        self.draft = NotificationDraft::default();
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            full_name: "Dr. Okafor".into(),
            role,
        }
    }

    fn draft() -> NotificationDraft {
        NotificationDraft {
            title: "Quiz".into(),
            message: "Friday, chapter 4".into(),
            recipient_role: Some(Role::Student),
            ..Default::default()
        }
    }

    #[test]
    fn students_cannot_compose() {
        let err = draft().validate(&profile(Role::Student)).unwrap_err();
        assert!(matches!(err, NotifyError::Authorization(_)));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let sender = profile(Role::Faculty);

        let mut missing_title = draft();
        missing_title.title = "   ".into();
        assert!(matches!(
            missing_title.validate(&sender),
            Err(NotifyError::Validation(_))
        ));

        let mut missing_message = draft();
        missing_message.message.clear();
        assert!(matches!(
            missing_message.validate(&sender),
            Err(NotifyError::Validation(_))
        ));
    }

    #[test]
    fn exactly_one_target_is_required() {
        let sender = profile(Role::Admin);

        let mut both = draft();
        both.recipient_id = Some(Uuid::new_v4());
        assert!(matches!(both.validate(&sender), Err(NotifyError::Validation(_))));

        let mut neither = draft();
        neither.recipient_role = None;
        assert!(matches!(neither.validate(&sender), Err(NotifyError::Validation(_))));
    }

    #[test]
    fn validated_draft_is_trimmed_and_attributed() {
        let sender = profile(Role::Faculty);
        let mut padded = draft();
        padded.title = "  Quiz ".into();

        let new = padded.validate(&sender).unwrap();
        assert_eq!(new.title, "Quiz");
        assert_eq!(new.sender_id, Some(sender.user_id));
        assert_eq!(new.recipient, Recipient::Role(Role::Student));
        assert_eq!(new.category, NotificationCategory::General);
    }

    #[test]
    fn form_targets_are_mutually_exclusive() {
        let mut form = ComposeForm::new();
        let person = Uuid::new_v4();

        form.target_role(Role::Student);
        form.target_person(person);
        assert_eq!(form.draft().recipient_id, Some(person));
        assert_eq!(form.draft().recipient_role, None);

        form.target_role(Role::Faculty);
        assert_eq!(form.draft().recipient_id, None);
        assert_eq!(form.draft().recipient_role, Some(Role::Faculty));
    }
}
