//! Policy Record Aggregate
//!
//! One policy record exists per rental-insurance attempt. It is created in
//! `Quoted` by the quote service and moved forward only by the payment
//! service.
//!
//! # Lifecycle
//!
//! ```text
//! Quoted ──────────────┐
//! InsufficientBalance ─┼─> PaymentPending ──> Active
//! Failed ──────────────┘        │  ▲
//!                               │  └── (stale claim takeover)
//!                               ├──> InsufficientBalance
//!                               └──> Failed
//! ```
//!
//! # Invariants
//!
//! - `premium_amount` is never negative
//! - At least one coverage flag is set
//! - `quote_id` precedes `payment_id`, which precedes `policy_no`/`policy_id`
//! - `Active` is terminal
//! - The renter and coverage snapshots never change after creation

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CustomerId, Money, PolicyRecordId, RentalId, TenantId};

use crate::coverage::{CoverageTypes, DocumentHandles};
use crate::error::PolicyError;
use crate::renter::RenterDetails;
use crate::trip::TripDetails;

/// Policy record lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    /// Provider quote and payment handle obtained, payment not yet attempted
    Quoted,
    /// A confirmation attempt holds the record
    PaymentPending,
    /// Policy issued; terminal
    Active,
    /// Provider account underfunded; retryable once the balance is restored
    InsufficientBalance,
    /// Hard failure; needs manual intervention before a retry
    Failed,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Quoted => "quoted",
            PolicyStatus::PaymentPending => "payment_pending",
            PolicyStatus::Active => "active",
            PolicyStatus::InsufficientBalance => "insufficient_balance",
            PolicyStatus::Failed => "failed",
        }
    }

    /// Whether a confirmation attempt may claim a record in this state
    pub fn is_claimable(&self) -> bool {
        matches!(
            self,
            PolicyStatus::Quoted | PolicyStatus::InsufficientBalance | PolicyStatus::Failed
        )
    }

    /// The transition table. `PaymentPending -> PaymentPending` is the
    /// takeover of a stale claim.
    pub fn can_transition_to(&self, next: PolicyStatus) -> bool {
        use PolicyStatus::*;
        matches!(
            (self, next),
            (Quoted, PaymentPending)
                | (InsufficientBalance, PaymentPending)
                | (Failed, PaymentPending)
                | (PaymentPending, PaymentPending)
                | (PaymentPending, Active)
                | (PaymentPending, InsufficientBalance)
                | (PaymentPending, Failed)
        )
    }

    /// Validates a transition, returning the new state
    pub fn transition(self, next: PolicyStatus) -> Result<PolicyStatus, PolicyError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PolicyError::InvalidStateTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quoted" => Ok(PolicyStatus::Quoted),
            "payment_pending" => Ok(PolicyStatus::PaymentPending),
            "active" => Ok(PolicyStatus::Active),
            "insufficient_balance" => Ok(PolicyStatus::InsufficientBalance),
            "failed" => Ok(PolicyStatus::Failed),
            other => Err(PolicyError::validation(format!("unknown policy status '{}'", other))),
        }
    }
}

/// Handles returned by the provider when a policy is issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuance {
    pub policy_no: String,
    pub policy_id: Option<String>,
    pub documents: DocumentHandles,
    pub issued_at: DateTime<Utc>,
}

/// Failure reason kept on a record whose payment was captured but whose
/// activation write did not land
pub fn capture_reason(policy_no: &str) -> String {
    format!("payment captured as policy {}; activation pending", policy_no)
}

/// Input for a freshly quoted record
#[derive(Debug, Clone)]
pub struct NewPolicyRecord {
    pub rental_id: RentalId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub quote_id: String,
    pub payment_id: Option<String>,
    pub coverage_types: CoverageTypes,
    pub trip: TripDetails,
    pub premium_amount: Money,
    pub renter_details: RenterDetails,
}

/// All persisted fields, used by repositories to restore a record
#[derive(Debug, Clone)]
pub struct PolicyRecordParts {
    pub id: PolicyRecordId,
    pub rental_id: RentalId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub quote_id: Option<String>,
    pub payment_id: Option<String>,
    pub policy_id: Option<String>,
    pub policy_no: Option<String>,
    pub coverage_types: CoverageTypes,
    pub trip: TripDetails,
    pub premium_amount: Money,
    pub renter_details: RenterDetails,
    pub status: PolicyStatus,
    pub payment_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent representation of one insurance purchase attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    id: PolicyRecordId,
    rental_id: RentalId,
    tenant_id: TenantId,
    customer_id: CustomerId,
    quote_id: Option<String>,
    payment_id: Option<String>,
    policy_id: Option<String>,
    policy_no: Option<String>,
    coverage_types: CoverageTypes,
    trip: TripDetails,
    premium_amount: Money,
    renter_details: RenterDetails,
    status: PolicyStatus,
    payment_reference: Option<String>,
    failure_reason: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PolicyRecord {
    /// Creates a record in `Quoted`
    ///
    /// # Errors
    ///
    /// Returns a validation error if no coverage is selected, the premium
    /// is negative, or the quote identifier is blank.
    pub fn quoted(new: NewPolicyRecord, now: DateTime<Utc>) -> Result<Self, PolicyError> {
        if !new.coverage_types.selection.any() {
            return Err(PolicyError::validation("at least one coverage must be selected"));
        }
        if new.premium_amount.is_negative() {
            return Err(PolicyError::validation("premium amount cannot be negative"));
        }
        if new.quote_id.trim().is_empty() {
            return Err(PolicyError::validation("quote identifier is required"));
        }

        Ok(Self {
            id: PolicyRecordId::new_v7(),
            rental_id: new.rental_id,
            tenant_id: new.tenant_id,
            customer_id: new.customer_id,
            quote_id: Some(new.quote_id),
            payment_id: new.payment_id.filter(|p| !p.trim().is_empty()),
            policy_id: None,
            policy_no: None,
            coverage_types: new.coverage_types,
            trip: new.trip,
            premium_amount: new.premium_amount,
            renter_details: new.renter_details,
            status: PolicyStatus::Quoted,
            payment_reference: None,
            failure_reason: None,
            issued_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Restores a record from persisted fields
    pub fn from_parts(parts: PolicyRecordParts) -> Self {
        Self {
            id: parts.id,
            rental_id: parts.rental_id,
            tenant_id: parts.tenant_id,
            customer_id: parts.customer_id,
            quote_id: parts.quote_id,
            payment_id: parts.payment_id,
            policy_id: parts.policy_id,
            policy_no: parts.policy_no,
            coverage_types: parts.coverage_types,
            trip: parts.trip,
            premium_amount: parts.premium_amount,
            renter_details: parts.renter_details,
            status: parts.status,
            payment_reference: parts.payment_reference,
            failure_reason: parts.failure_reason,
            issued_at: parts.issued_at,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    pub fn id(&self) -> PolicyRecordId {
        self.id
    }

    pub fn rental_id(&self) -> RentalId {
        self.rental_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn quote_id(&self) -> Option<&str> {
        self.quote_id.as_deref()
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }

    pub fn policy_no(&self) -> Option<&str> {
        self.policy_no.as_deref()
    }

    pub fn coverage_types(&self) -> &CoverageTypes {
        &self.coverage_types
    }

    pub fn trip(&self) -> &TripDetails {
        &self.trip
    }

    pub fn premium_amount(&self) -> Money {
        self.premium_amount
    }

    pub fn renter_details(&self) -> &RenterDetails {
        &self.renter_details
    }

    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True once the policy is active
    pub fn is_issued(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    /// Whether a confirmation attempt may claim this record now
    ///
    /// A record stuck in `PaymentPending` longer than `lease` is treated as
    /// abandoned by a crashed attempt and may be taken over.
    pub fn can_claim(&self, now: DateTime<Utc>, lease: Duration) -> bool {
        match self.status {
            PolicyStatus::PaymentPending => self.updated_at < now - lease,
            status => status.is_claimable(),
        }
    }

    /// Moves the record into `PaymentPending`, returning the previous status
    pub fn begin_payment(
        &mut self,
        payment_reference: &str,
        now: DateTime<Utc>,
    ) -> Result<PolicyStatus, PolicyError> {
        let previous = self.status;
        self.status = previous.transition(PolicyStatus::PaymentPending)?;
        self.payment_reference = Some(payment_reference.to_string());
        self.updated_at = now;
        Ok(previous)
    }

    /// Replaces the quote and payment handles in place after a recovered quote
    pub fn replace_quote_handles(
        &mut self,
        quote_id: String,
        payment_id: String,
        now: DateTime<Utc>,
    ) -> Result<(), PolicyError> {
        if self.status != PolicyStatus::PaymentPending {
            return Err(PolicyError::validation(format!(
                "quote handles can only be replaced while payment is pending (status {})",
                self.status
            )));
        }
        self.quote_id = Some(quote_id);
        self.payment_id = Some(payment_id);
        self.updated_at = now;
        Ok(())
    }

    /// Activates the record with the provider's issuance handles
    pub fn activate(&mut self, issuance: &Issuance, now: DateTime<Utc>) -> Result<(), PolicyError> {
        if self.payment_id.is_none() {
            return Err(PolicyError::validation(
                "cannot activate a policy record without a payment handle",
            ));
        }
        if let Some(captured) = self.policy_no.as_deref() {
            if captured != issuance.policy_no {
                return Err(PolicyError::validation(format!(
                    "record already holds captured policy {}",
                    captured
                )));
            }
        }
        self.status = self.status.transition(PolicyStatus::Active)?;
        self.policy_no = Some(issuance.policy_no.clone());
        self.policy_id = issuance.policy_id.clone();
        self.coverage_types.merge_documents(&issuance.documents);
        self.failure_reason = None;
        self.issued_at = Some(issuance.issued_at);
        self.updated_at = now;
        Ok(())
    }

    /// Stores issuance handles for a captured payment whose activation
    /// could not be written, leaving the record in `PaymentPending`
    ///
    /// A later claim finds the handles through [`Self::captured_issuance`]
    /// and finishes activation without charging again.
    pub fn record_capture(&mut self, issuance: &Issuance, now: DateTime<Utc>) -> Result<(), PolicyError> {
        if self.status != PolicyStatus::PaymentPending || self.policy_no.is_some() {
            return Err(PolicyError::validation(format!(
                "a captured payment can only be recorded once while payment is pending (status {})",
                self.status
            )));
        }
        self.policy_no = Some(issuance.policy_no.clone());
        self.policy_id = issuance.policy_id.clone();
        self.coverage_types.merge_documents(&issuance.documents);
        self.failure_reason = Some(capture_reason(&issuance.policy_no));
        self.issued_at = Some(issuance.issued_at);
        self.updated_at = now;
        Ok(())
    }

    /// Issuance handles of a payment the provider already captured but
    /// which was never activated
    pub fn captured_issuance(&self) -> Option<Issuance> {
        if self.is_issued() {
            return None;
        }
        let policy_no = self.policy_no.clone()?;
        Some(Issuance {
            policy_no,
            policy_id: self.policy_id.clone(),
            documents: self.coverage_types.documents.clone(),
            issued_at: self.issued_at.unwrap_or(self.updated_at),
        })
    }

    /// Records a classified payment failure
    pub fn fail(
        &mut self,
        status: PolicyStatus,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PolicyError> {
        if !matches!(status, PolicyStatus::InsufficientBalance | PolicyStatus::Failed) {
            return Err(PolicyError::validation(format!(
                "{} is not a failure status",
                status
            )));
        }
        self.status = self.status.transition(status)?;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }
}
