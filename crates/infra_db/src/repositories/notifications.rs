//! In-app notifications and the email outbox
//!
//! Email is not sent from the request path. Rendered messages are written
//! to `email_outbox` with status `pending` and picked up by the mail worker.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_notification(&self, row: &NotificationRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                notification_id, tenant_id, user_id, kind, title, message,
                rental_id, policy_record_id, observed_balance, required_premium, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(row.notification_id)
        .bind(row.tenant_id)
        .bind(row.user_id)
        .bind(&row.kind)
        .bind(&row.title)
        .bind(&row.message)
        .bind(row.rental_id)
        .bind(row.policy_record_id)
        .bind(row.observed_balance)
        .bind(row.required_premium)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Unread notifications for one user, newest first
    pub async fn unread_for_user(&self, user_id: Uuid) -> Result<Vec<NotificationRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT notification_id, tenant_id, user_id, kind, title, message,
                   rental_id, policy_record_id, observed_balance, required_premium, created_at
            FROM notifications
            WHERE user_id = $1 AND read_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Queues an email and returns its outbox id
    pub async fn enqueue_email(&self, email: &NewOutboxEmail) -> Result<Uuid, DatabaseError> {
        let email_id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO email_outbox (email_id, tenant_id, recipients, subject, body)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(email_id)
        .bind(email.tenant_id)
        .bind(&email.recipients)
        .bind(&email.subject)
        .bind(&email.body)
        .execute(&self.pool)
        .await?;

        Ok(email_id)
    }

    pub async fn pending_emails(&self, tenant_id: Uuid) -> Result<Vec<OutboxEmailRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, OutboxEmailRow>(
            r#"
            SELECT email_id, tenant_id, recipients, subject, body, status, created_at
            FROM email_outbox
            WHERE tenant_id = $1 AND status = 'pending'
            ORDER BY created_at
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub notification_id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub rental_id: Uuid,
    pub policy_record_id: Uuid,
    pub observed_balance: Option<Decimal>,
    pub required_premium: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOutboxEmail {
    pub tenant_id: Uuid,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxEmailRow {
    pub email_id: Uuid,
    pub tenant_id: Uuid,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
