//! Notification emission and the recipient's inbox.

use std::sync::Arc;

use uuid::Uuid;

use super::{Actor, resolve_summaries};
use crate::domain::{Notification, NotificationKind, NotificationView};
use crate::error::DomainError;
use crate::ports::{NotificationRepository, UserRepository};

pub struct Notifier {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
}

impl Notifier {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            notifications,
            users,
        }
    }

    /// Record a notification. A failure is logged and swallowed so it never
    /// undoes the mutation that triggered it. Returns whether it was stored.
    pub async fn emit(&self, from: Uuid, to: Uuid, kind: NotificationKind) -> bool {
        match self
            .notifications
            .create(Notification::new(from, to, kind))
            .await
        {
            Ok(notification) => {
                tracing::debug!(
                    notification_id = %notification.id,
                    from = %from,
                    to = %to,
                    kind = %kind,
                    "Notification created"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    from = %from,
                    to = %to,
                    kind = %kind,
                    error = %e,
                    "Failed to create notification"
                );
                false
            }
        }
    }

    /// The actor's notifications, newest first, with the sender resolved.
    pub async fn list(&self, actor: Actor) -> Result<Vec<NotificationView>, DomainError> {
        let mut notifications = self.notifications.find_by_recipient(actor.id).await?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let senders = resolve_summaries(
            self.users.as_ref(),
            notifications.iter().map(|n| n.from),
        )
        .await?;

        Ok(notifications
            .into_iter()
            .map(|notification| NotificationView {
                from: senders.get(&notification.from).cloned(),
                notification,
            })
            .collect())
    }
}
