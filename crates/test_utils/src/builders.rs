//! Test Data Builders
//!
//! Builders with sensible defaults so tests only state the fields they care
//! about. [`PolicyRecordBuilder`] restores records directly through
//! `PolicyRecord::from_parts`, which lets a test start from any lifecycle
//! state without driving the services there.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use core_kernel::{Currency, CustomerId, Money, PolicyRecordId, RentalId, TenantId};
use domain_policy::{
    CoverageCode, CoverageSelection, CoverageTypes, DocumentHandles, PolicyRecord,
    PolicyRecordParts, PolicyStatus, QuoteRequest, RenterDetails, TripDetails,
};

use crate::fixtures::{CoverageFixtures, MoneyFixtures, RenterFixtures, TripFixtures};

/// Builder for policy records in any state
pub struct PolicyRecordBuilder {
    parts: PolicyRecordParts,
}

impl Default for PolicyRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRecordBuilder {
    /// A `Quoted` record with quote and payment handles
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            parts: PolicyRecordParts {
                id: PolicyRecordId::new_v7(),
                rental_id: RentalId::new(),
                tenant_id: TenantId::new(),
                customer_id: CustomerId::new(),
                quote_id: Some("Q-1001".to_string()),
                payment_id: Some("PAY-1001".to_string()),
                policy_id: None,
                policy_no: None,
                coverage_types: CoverageTypes::new(CoverageFixtures::standard()),
                trip: TripFixtures::standard(),
                premium_amount: MoneyFixtures::usd_standard_premium(),
                renter_details: RenterFixtures::standard(),
                status: PolicyStatus::Quoted,
                payment_reference: None,
                failure_reason: None,
                issued_at: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: PolicyRecordId) -> Self {
        self.parts.id = id;
        self
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.parts.tenant_id = tenant_id;
        self
    }

    pub fn with_rental(mut self, rental_id: RentalId) -> Self {
        self.parts.rental_id = rental_id;
        self
    }

    pub fn with_status(mut self, status: PolicyStatus) -> Self {
        self.parts.status = status;
        self
    }

    /// A record whose quote lost its payment handle
    pub fn without_payment_id(mut self) -> Self {
        self.parts.payment_id = None;
        self
    }

    pub fn with_quote_id(mut self, quote_id: Option<&str>) -> Self {
        self.parts.quote_id = quote_id.map(str::to_string);
        self
    }

    pub fn with_coverage(mut self, selection: CoverageSelection) -> Self {
        self.parts.coverage_types = CoverageTypes::new(selection);
        self
    }

    pub fn with_documents(mut self, documents: DocumentHandles) -> Self {
        self.parts.coverage_types.documents = documents;
        self
    }

    pub fn with_premium(mut self, amount: Decimal) -> Self {
        self.parts.premium_amount = Money::new(amount, Currency::USD);
        self
    }

    pub fn with_trip(mut self, trip: TripDetails) -> Self {
        self.parts.trip = trip;
        self
    }

    pub fn with_renter(mut self, renter: RenterDetails) -> Self {
        self.parts.renter_details = renter;
        self
    }

    pub fn with_failure(mut self, status: PolicyStatus, reason: impl Into<String>) -> Self {
        self.parts.status = status;
        self.parts.failure_reason = Some(reason.into());
        self
    }

    /// A `PaymentPending` claim last touched `age` ago
    pub fn pending_since(mut self, age: Duration, payment_reference: &str) -> Self {
        self.parts.status = PolicyStatus::PaymentPending;
        self.parts.payment_reference = Some(payment_reference.to_string());
        self.parts.updated_at = Utc::now() - age;
        self
    }

    /// An `Active` record with issuance handles
    pub fn issued(mut self, policy_no: &str, issued_at: DateTime<Utc>) -> Self {
        self.parts.status = PolicyStatus::Active;
        self.parts.policy_no = Some(policy_no.to_string());
        self.parts.policy_id = Some("9001".to_string());
        self.parts.payment_reference = Some("pi_fixture".to_string());
        self.parts
            .coverage_types
            .documents
            .insert(CoverageCode::Cdw, "https://docs.example/cdw.pdf".to_string());
        self.parts.issued_at = Some(issued_at);
        self.parts.updated_at = issued_at;
        self
    }

    pub fn build(self) -> PolicyRecord {
        PolicyRecord::from_parts(self.parts)
    }
}

/// Builder for quote requests
pub struct QuoteRequestBuilder {
    request: QuoteRequest,
}

impl QuoteRequestBuilder {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            request: QuoteRequest {
                rental_id: RentalId::new(),
                customer_id: CustomerId::new(),
                tenant_id,
                trip: TripFixtures::standard(),
                coverage: CoverageFixtures::standard(),
                renter: RenterFixtures::standard(),
            },
        }
    }

    pub fn with_rental(mut self, rental_id: RentalId) -> Self {
        self.request.rental_id = rental_id;
        self
    }

    pub fn with_trip(mut self, trip: TripDetails) -> Self {
        self.request.trip = trip;
        self
    }

    pub fn with_coverage(mut self, coverage: CoverageSelection) -> Self {
        self.request.coverage = coverage;
        self
    }

    pub fn with_renter(mut self, renter: RenterDetails) -> Self {
        self.request.renter = renter;
        self
    }

    pub fn build(self) -> QuoteRequest {
        self.request
    }
}
