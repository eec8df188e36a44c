//! Quote and premium estimate DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CustomerId, RentalId, TenantId};
use domain_policy::{
    CoverageCode, CoverageSelection, PremiumCalculation, PremiumSource, QuoteRequest, QuoteResult,
    RenterDetails, TripDetails,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    pub rental_id: Uuid,
    pub customer_id: Uuid,
    pub tenant_id: Uuid,
    pub trip_start: DateTime<Utc>,
    pub trip_end: DateTime<Utc>,
    #[validate(length(min = 1, message = "pickup state is required"))]
    pub pickup_state: String,
    pub coverage: CoverageSelection,
    pub renter: RenterDetails,
}

impl From<CreateQuoteRequest> for QuoteRequest {
    fn from(request: CreateQuoteRequest) -> Self {
        QuoteRequest {
            rental_id: RentalId::from_uuid(request.rental_id),
            customer_id: CustomerId::from_uuid(request.customer_id),
            tenant_id: TenantId::from_uuid(request.tenant_id),
            trip: TripDetails::new(request.trip_start, request.trip_end, request.pickup_state),
            coverage: request.coverage,
            renter: request.renter,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub policy_record_id: Uuid,
    pub quote_id: String,
    pub payment_id: Option<String>,
    /// Two-decimal premium, e.g. "141.39"
    pub premium: String,
    pub currency: String,
    pub premium_source: PremiumSource,
}

impl From<QuoteResult> for QuoteResponse {
    fn from(result: QuoteResult) -> Self {
        Self {
            policy_record_id: *result.policy_record_id.as_uuid(),
            quote_id: result.quote_id,
            payment_id: result.payment_id,
            premium: result.premium.to_fixed_string(),
            currency: result.premium.currency().code().to_string(),
            premium_source: result.premium_source,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PremiumEstimateRequest {
    pub coverage: CoverageSelection,
    pub trip_start: DateTime<Utc>,
    pub trip_end: DateTime<Utc>,
}

impl PremiumEstimateRequest {
    /// The priced window; pickup region does not affect the rate table
    pub fn trip(&self) -> TripDetails {
        TripDetails::new(self.trip_start, self.trip_end, "")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PremiumEstimateResponse {
    pub days: u32,
    pub currency: String,
    pub total: String,
    pub breakdown: BTreeMap<CoverageCode, String>,
}

impl From<PremiumCalculation> for PremiumEstimateResponse {
    fn from(calculation: PremiumCalculation) -> Self {
        Self {
            days: calculation.days,
            currency: calculation.total.currency().code().to_string(),
            total: calculation.total.to_fixed_string(),
            breakdown: calculation
                .breakdown
                .into_iter()
                .map(|(code, line)| (code, line.to_fixed_string()))
                .collect(),
        }
    }
}
