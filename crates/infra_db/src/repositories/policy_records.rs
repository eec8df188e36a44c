//! Policy record repository
//!
//! One row per insurance purchase attempt. Coverage and renter snapshots are
//! JSONB; status is the `policy_record_status` enum. Every status change
//! after creation is a conditional update guarded on the current status, so
//! two concurrent confirmations can never both move the same row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const COLUMNS: &str = r#"
    policy_record_id,
    rental_id,
    tenant_id,
    customer_id,
    quote_id,
    payment_id,
    policy_id,
    policy_no,
    coverage_types,
    trip_start,
    trip_end,
    pickup_state,
    premium_amount,
    currency,
    renter_details,
    status,
    payment_reference,
    failure_reason,
    issued_at,
    created_at,
    updated_at
"#;

/// Repository for the `policy_records` table
#[derive(Debug, Clone)]
pub struct PolicyRecordRepository {
    pool: PgPool,
}

impl PolicyRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, record: &PolicyRecordRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO policy_records (
                policy_record_id, rental_id, tenant_id, customer_id,
                quote_id, payment_id, policy_id, policy_no,
                coverage_types, trip_start, trip_end, pickup_state,
                premium_amount, currency, renter_details, status,
                payment_reference, failure_reason, issued_at, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(record.policy_record_id)
        .bind(record.rental_id)
        .bind(record.tenant_id)
        .bind(record.customer_id)
        .bind(&record.quote_id)
        .bind(&record.payment_id)
        .bind(&record.policy_id)
        .bind(&record.policy_no)
        .bind(&record.coverage_types)
        .bind(record.trip_start)
        .bind(record.trip_end)
        .bind(&record.pickup_state)
        .bind(record.premium_amount)
        .bind(&record.currency)
        .bind(&record.renter_details)
        .bind(record.status)
        .bind(&record.payment_reference)
        .bind(&record.failure_reason)
        .bind(record.issued_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find(&self, policy_record_id: Uuid) -> Result<Option<PolicyRecordRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PolicyRecordRow>(&format!(
            "SELECT {} FROM policy_records WHERE policy_record_id = $1",
            COLUMNS
        ))
        .bind(policy_record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Atomically moves a claimable record into `payment_pending`
    ///
    /// Claimable means `quoted`, `insufficient_balance`, `failed`, or a
    /// `payment_pending` row whose `updated_at` is older than
    /// `stale_before`. The row lock taken by the subquery serializes
    /// concurrent claims: the second one re-evaluates the predicate against
    /// the freshly claimed row and matches nothing.
    ///
    /// Returns the claimed row and the status it had before the claim, or
    /// `None` when the record is not claimable right now.
    pub async fn claim_for_payment(
        &self,
        policy_record_id: Uuid,
        payment_reference: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<ClaimedRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ClaimedRow>(&format!(
            r#"
            WITH claimable AS (
                SELECT policy_record_id, status AS previous_status
                FROM policy_records
                WHERE policy_record_id = $1
                  AND (
                      status IN ('quoted', 'insufficient_balance', 'failed')
                      OR (status = 'payment_pending' AND updated_at < $4)
                  )
                FOR UPDATE
            )
            UPDATE policy_records AS p
            SET status = 'payment_pending',
                payment_reference = $2,
                updated_at = $3
            FROM claimable
            WHERE p.policy_record_id = claimable.policy_record_id
            RETURNING {}, claimable.previous_status
            "#,
            prefixed_columns("p")
        ))
        .bind(policy_record_id)
        .bind(payment_reference)
        .bind(now)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Stores recovered quote handles; only valid while `payment_pending`
    pub async fn replace_quote_handles(
        &self,
        policy_record_id: Uuid,
        quote_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE policy_records
            SET quote_id = $2, payment_id = $3, updated_at = $4
            WHERE policy_record_id = $1 AND status = 'payment_pending'
            "#,
        )
        .bind(policy_record_id)
        .bind(quote_id)
        .bind(payment_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::StaleState(format!(
                "policy record {} is not payment_pending",
                policy_record_id
            )));
        }
        Ok(())
    }

    /// Activates a claimed record, merging issued document handles into the
    /// coverage snapshot
    pub async fn mark_active(
        &self,
        policy_record_id: Uuid,
        activation: &Activation,
    ) -> Result<PolicyRecordRow, DatabaseError> {
        sqlx::query_as::<_, PolicyRecordRow>(&format!(
            r#"
            UPDATE policy_records
            SET status = 'active',
                policy_no = $2,
                policy_id = $3,
                coverage_types = jsonb_set(
                    coverage_types,
                    '{{documents}}',
                    COALESCE(coverage_types -> 'documents', '{{}}'::jsonb) || $4
                ),
                failure_reason = NULL,
                issued_at = $5,
                updated_at = $5
            WHERE policy_record_id = $1
              AND status = 'payment_pending'
              AND payment_id IS NOT NULL
              AND (policy_no IS NULL OR policy_no = $2)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(policy_record_id)
        .bind(&activation.policy_no)
        .bind(&activation.policy_id)
        .bind(&activation.documents)
        .bind(activation.issued_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            DatabaseError::StaleState(format!(
                "policy record {} cannot be activated from its current state",
                policy_record_id
            ))
        })
    }

    /// Stores issuance handles of a captured payment without activating
    ///
    /// Applies only to a `payment_pending` row that has no policy number
    /// yet, so the first captured policy is never overwritten.
    pub async fn record_capture(
        &self,
        policy_record_id: Uuid,
        activation: &Activation,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE policy_records
            SET policy_no = $2,
                policy_id = $3,
                coverage_types = jsonb_set(
                    coverage_types,
                    '{documents}',
                    COALESCE(coverage_types -> 'documents', '{}'::jsonb) || $4
                ),
                issued_at = $5,
                failure_reason = $6,
                updated_at = $7
            WHERE policy_record_id = $1
              AND status = 'payment_pending'
              AND policy_no IS NULL
            "#,
        )
        .bind(policy_record_id)
        .bind(&activation.policy_no)
        .bind(&activation.policy_id)
        .bind(&activation.documents)
        .bind(activation.issued_at)
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::StaleState(format!(
                "policy record {} cannot record a captured payment from its current state",
                policy_record_id
            )));
        }
        Ok(())
    }

    /// Records a failure status on a claimed record
    pub async fn mark_unsuccessful(
        &self,
        policy_record_id: Uuid,
        status: PolicyRecordStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE policy_records
            SET status = $2, failure_reason = $3, updated_at = $4
            WHERE policy_record_id = $1 AND status = 'payment_pending'
            "#,
        )
        .bind(policy_record_id)
        .bind(status)
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::StaleState(format!(
                "policy record {} is not payment_pending",
                policy_record_id
            )));
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Row types
// ============================================================================

/// Policy record lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "policy_record_status", rename_all = "snake_case")]
pub enum PolicyRecordStatus {
    Quoted,
    PaymentPending,
    Active,
    InsufficientBalance,
    Failed,
}

/// Database row for a policy record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyRecordRow {
    pub policy_record_id: Uuid,
    pub rental_id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub quote_id: Option<String>,
    pub payment_id: Option<String>,
    pub policy_id: Option<String>,
    pub policy_no: Option<String>,
    pub coverage_types: Json<JsonValue>,
    pub trip_start: DateTime<Utc>,
    pub trip_end: DateTime<Utc>,
    pub pickup_state: String,
    pub premium_amount: Decimal,
    pub currency: String,
    pub renter_details: Json<JsonValue>,
    pub status: PolicyRecordStatus,
    pub payment_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A claimed row together with the status it had before the claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimedRow {
    #[sqlx(flatten)]
    pub record: PolicyRecordRow,
    pub previous_status: PolicyRecordStatus,
}

/// Issuance handles written by [`PolicyRecordRepository::mark_active`]
#[derive(Debug, Clone)]
pub struct Activation {
    pub policy_no: String,
    pub policy_id: Option<String>,
    /// JSON object of coverage code to document handle
    pub documents: Json<JsonValue>,
    pub issued_at: DateTime<Utc>,
}
