//! PostgreSQL Policy Record Adapter
//!
//! Implements the domain `PolicyRecordRepository` port over
//! [`PolicyRecordRepository`](crate::repositories::PolicyRecordRepository).
//! State guards live in SQL: a conditional update that matches no row is
//! reported as `PortError::Conflict`, the same answer the domain state
//! machine gives for an illegal transition.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPolicyRecordAdapter;
//! use domain_policy::PolicyRecordRepository;
//!
//! let records: Arc<dyn PolicyRecordRepository> =
//!     Arc::new(PostgresPolicyRecordAdapter::new(pool));
//! let claimed = records.claim_for_payment(id, "pay-ref", lease, Utc::now()).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, Money,
    PolicyRecordId, PortError, RentalId, TenantId,
};
use domain_policy::{
    capture_reason, ClaimedRecord, CoverageTypes, Issuance, PolicyRecord, PolicyRecordParts,
    PolicyRecordRepository as PolicyRecordPort, PolicyStatus, RenterDetails, TripDetails,
};

use crate::error::DatabaseError;
use crate::repositories::policy_records::{
    Activation, PolicyRecordRepository, PolicyRecordRow, PolicyRecordStatus as DbStatus,
};

const ADAPTER_ID: &str = "postgres-policy-record-adapter";

/// Ping latency above which the store is reported degraded
const DEGRADED_LATENCY_MS: u64 = 500;

/// PostgreSQL-backed policy record storage
#[derive(Debug, Clone)]
pub struct PostgresPolicyRecordAdapter {
    repository: PolicyRecordRepository,
}

impl PostgresPolicyRecordAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PolicyRecordRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &PolicyRecordRepository {
        &self.repository
    }
}

impl DomainPort for PostgresPolicyRecordAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPolicyRecordAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.repository.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(()) if latency_ms > DEGRADED_LATENCY_MS => (
                AdapterHealth::Degraded,
                Some(format!("Slow database ping: {}ms", latency_ms)),
            ),
            Ok(()) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PolicyRecordPort for PostgresPolicyRecordAdapter {
    #[instrument(skip(self, record), fields(policy_record_id = %record.id()))]
    async fn insert(&self, record: &PolicyRecord) -> Result<(), PortError> {
        let row = record_to_row(record)?;
        self.repository.insert(&row).await?;
        debug!("Inserted policy record");
        Ok(())
    }

    async fn find(&self, id: PolicyRecordId) -> Result<Option<PolicyRecord>, PortError> {
        match self.repository.find(*id.as_uuid()).await? {
            Some(row) => Ok(Some(row_to_record(row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, payment_reference), fields(policy_record_id = %id))]
    async fn claim_for_payment(
        &self,
        id: PolicyRecordId,
        payment_reference: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<ClaimedRecord>, PortError> {
        let claimed = self
            .repository
            .claim_for_payment(*id.as_uuid(), payment_reference, now, now - lease)
            .await?;

        match claimed {
            Some(row) => {
                let previous_status = status_from_db(row.previous_status);
                debug!(previous_status = %previous_status, "Claimed policy record");
                Ok(Some(ClaimedRecord {
                    record: row_to_record(row.record)?,
                    previous_status,
                }))
            }
            None => Ok(None),
        }
    }

    async fn replace_quote_handles(
        &self,
        id: PolicyRecordId,
        quote_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        self.repository
            .replace_quote_handles(*id.as_uuid(), quote_id, payment_id, now)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, issuance), fields(policy_record_id = %id, policy_no = %issuance.policy_no))]
    async fn record_capture(
        &self,
        id: PolicyRecordId,
        issuance: &Issuance,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let activation = to_activation(issuance)?;
        self.repository
            .record_capture(*id.as_uuid(), &activation, &capture_reason(&issuance.policy_no), now)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, issuance), fields(policy_record_id = %id, policy_no = %issuance.policy_no))]
    async fn mark_active(&self, id: PolicyRecordId, issuance: &Issuance) -> Result<PolicyRecord, PortError> {
        let activation = to_activation(issuance)?;
        let row = self.repository.mark_active(*id.as_uuid(), &activation).await?;
        row_to_record(row)
    }

    async fn mark_unsuccessful(
        &self,
        id: PolicyRecordId,
        status: PolicyStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PortError> {
        if !matches!(status, PolicyStatus::InsufficientBalance | PolicyStatus::Failed) {
            return Err(PortError::validation(format!(
                "{} is not a failure status",
                status
            )));
        }
        self.repository
            .mark_unsuccessful(*id.as_uuid(), status_to_db(status), reason, now)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn status_to_db(status: PolicyStatus) -> DbStatus {
    match status {
        PolicyStatus::Quoted => DbStatus::Quoted,
        PolicyStatus::PaymentPending => DbStatus::PaymentPending,
        PolicyStatus::Active => DbStatus::Active,
        PolicyStatus::InsufficientBalance => DbStatus::InsufficientBalance,
        PolicyStatus::Failed => DbStatus::Failed,
    }
}

fn status_from_db(status: DbStatus) -> PolicyStatus {
    match status {
        DbStatus::Quoted => PolicyStatus::Quoted,
        DbStatus::PaymentPending => PolicyStatus::PaymentPending,
        DbStatus::Active => PolicyStatus::Active,
        DbStatus::InsufficientBalance => PolicyStatus::InsufficientBalance,
        DbStatus::Failed => PolicyStatus::Failed,
    }
}

fn to_activation(issuance: &Issuance) -> Result<Activation, DatabaseError> {
    Ok(Activation {
        policy_no: issuance.policy_no.clone(),
        policy_id: issuance.policy_id.clone(),
        documents: Json(serde_json::to_value(&issuance.documents)?),
        issued_at: issuance.issued_at,
    })
}

fn record_to_row(record: &PolicyRecord) -> Result<PolicyRecordRow, DatabaseError> {
    let premium = record.premium_amount();
    Ok(PolicyRecordRow {
        policy_record_id: *record.id().as_uuid(),
        rental_id: *record.rental_id().as_uuid(),
        tenant_id: *record.tenant_id().as_uuid(),
        customer_id: *record.customer_id().as_uuid(),
        quote_id: record.quote_id().map(str::to_string),
        payment_id: record.payment_id().map(str::to_string),
        policy_id: record.policy_id().map(str::to_string),
        policy_no: record.policy_no().map(str::to_string),
        coverage_types: Json(serde_json::to_value(record.coverage_types())?),
        trip_start: record.trip().start,
        trip_end: record.trip().end,
        pickup_state: record.trip().pickup_state.clone(),
        premium_amount: premium.round_to_currency().amount(),
        currency: premium.currency().code().to_string(),
        renter_details: Json(serde_json::to_value(record.renter_details())?),
        status: status_to_db(record.status()),
        payment_reference: record.payment_reference().map(str::to_string),
        failure_reason: record.failure_reason().map(str::to_string),
        issued_at: record.issued_at(),
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    })
}

fn row_to_record(row: PolicyRecordRow) -> Result<PolicyRecord, PortError> {
    let coverage_types: CoverageTypes =
        serde_json::from_value(row.coverage_types.0).map_err(DatabaseError::from)?;
    let renter_details: RenterDetails =
        serde_json::from_value(row.renter_details.0).map_err(DatabaseError::from)?;
    let currency = row
        .currency
        .parse()
        .map_err(|e| PortError::transformation(format!("policy record currency: {}", e)))?;

    Ok(PolicyRecord::from_parts(PolicyRecordParts {
        id: PolicyRecordId::from_uuid(row.policy_record_id),
        rental_id: RentalId::from_uuid(row.rental_id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        quote_id: row.quote_id,
        payment_id: row.payment_id,
        policy_id: row.policy_id,
        policy_no: row.policy_no,
        coverage_types,
        trip: TripDetails::new(row.trip_start, row.trip_end, row.pickup_state),
        premium_amount: Money::new(row.premium_amount, currency),
        renter_details,
        status: status_from_db(row.status),
        payment_reference: row.payment_reference,
        failure_reason: row.failure_reason,
        issued_at: row.issued_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
