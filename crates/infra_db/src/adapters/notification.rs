//! PostgreSQL notification sinks
//!
//! [`PostgresNotificationInbox`] writes in-app notices;
//! [`PostgresEmailOutbox`] queues rendered email for the mail worker.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use core_kernel::{DomainPort, PortError};
use domain_policy::{EmailDispatcher, InAppNotification, NotificationInbox, OutboundEmail};

use crate::repositories::notifications::{NewOutboxEmail, NotificationRepository, NotificationRow};

#[derive(Debug, Clone)]
pub struct PostgresNotificationInbox {
    repository: NotificationRepository,
}

impl PostgresNotificationInbox {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresNotificationInbox {}

#[async_trait]
impl NotificationInbox for PostgresNotificationInbox {
    async fn create(&self, notification: &InAppNotification) -> Result<(), PortError> {
        let row = NotificationRow {
            notification_id: *notification.id.as_uuid(),
            tenant_id: *notification.tenant_id.as_uuid(),
            user_id: *notification.user_id.as_uuid(),
            kind: notification.kind.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            rental_id: *notification.rental_id.as_uuid(),
            policy_record_id: *notification.policy_record_id.as_uuid(),
            observed_balance: notification.observed_balance,
            required_premium: notification.required_premium,
            created_at: notification.created_at,
        };
        self.repository.insert_notification(&row).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresEmailOutbox {
    repository: NotificationRepository,
}

impl PostgresEmailOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresEmailOutbox {}

#[async_trait]
impl EmailDispatcher for PostgresEmailOutbox {
    async fn enqueue(&self, email: &OutboundEmail) -> Result<(), PortError> {
        if email.to.is_empty() {
            return Err(PortError::validation("email has no recipients"));
        }
        let email_id = self
            .repository
            .enqueue_email(&NewOutboxEmail {
                tenant_id: *email.tenant_id.as_uuid(),
                recipients: email.to.clone(),
                subject: email.subject.clone(),
                body: email.body.clone(),
            })
            .await?;
        debug!(%email_id, recipients = email.to.len(), "Queued email");
        Ok(())
    }
}
