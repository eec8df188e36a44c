//! Policy record, payment, and balance DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_policy::{
    CoverageSelection, DocumentHandles, PaymentConfirmation, PolicyRecord, PolicyStatus,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    /// Reference of the payment-processor event that completed checkout
    #[validate(length(min = 1, max = 255, message = "payment reference is required"))]
    pub payment_reference: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub policy_record_id: Uuid,
    pub issued: bool,
    pub status: PolicyStatus,
    pub policy_no: Option<String>,
    pub policy_id: Option<String>,
    pub documents: DocumentHandles,
}

impl From<PaymentConfirmation> for PaymentResponse {
    fn from(confirmation: PaymentConfirmation) -> Self {
        Self {
            policy_record_id: *confirmation.policy_record_id.as_uuid(),
            issued: confirmation.issued,
            status: confirmation.status,
            policy_no: confirmation.policy_no,
            policy_id: confirmation.policy_id,
            documents: confirmation.documents,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PolicyResponse {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub tenant_id: Uuid,
    pub status: PolicyStatus,
    pub quote_id: Option<String>,
    pub payment_id: Option<String>,
    pub policy_no: Option<String>,
    pub policy_id: Option<String>,
    pub coverage: CoverageSelection,
    pub documents: DocumentHandles,
    pub premium: String,
    pub currency: String,
    pub trip_start: DateTime<Utc>,
    pub trip_end: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PolicyRecord> for PolicyResponse {
    fn from(record: &PolicyRecord) -> Self {
        let premium = record.premium_amount();
        Self {
            id: *record.id().as_uuid(),
            rental_id: *record.rental_id().as_uuid(),
            tenant_id: *record.tenant_id().as_uuid(),
            status: record.status(),
            quote_id: record.quote_id().map(str::to_string),
            payment_id: record.payment_id().map(str::to_string),
            policy_no: record.policy_no().map(str::to_string),
            policy_id: record.policy_id().map(str::to_string),
            coverage: record.coverage_types().selection,
            documents: record.coverage_types().documents.clone(),
            premium: premium.to_fixed_string(),
            currency: premium.currency().code().to_string(),
            trip_start: record.trip().start,
            trip_end: record.trip().end,
            failure_reason: record.failure_reason().map(str::to_string),
            issued_at: record.issued_at(),
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub tenant_id: Uuid,
    pub balance: Decimal,
}
