//! Quote creation

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{CustomerId, Money, PolicyRecordId, RentalId, TenantId};

use crate::aggregate::{NewPolicyRecord, PolicyRecord};
use crate::auth::{ProviderSession, TokenCache};
use crate::coverage::{CoverageSelection, CoverageTypes};
use crate::error::PolicyError;
use crate::ports::{CredentialStore, PolicyRecordRepository, RentalLedger, UnderwritingProvider};
use crate::premium::{PremiumCalculation, PremiumCalculator};
use crate::provider::{ProviderResponse, QuoteOutcome, QuoteSubmission};
use crate::renter::RenterDetails;
use crate::trip::TripDetails;

/// Everything the booking wizard hands over for a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub rental_id: RentalId,
    pub customer_id: CustomerId,
    pub tenant_id: TenantId,
    pub trip: TripDetails,
    pub coverage: CoverageSelection,
    pub renter: RenterDetails,
}

/// Where the persisted premium came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumSource {
    Provider,
    RateTable,
}

impl PremiumSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PremiumSource::Provider => "provider",
            PremiumSource::RateTable => "rate_table",
        }
    }
}

/// Outcome of a successful quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub policy_record_id: PolicyRecordId,
    pub quote_id: String,
    pub payment_id: Option<String>,
    pub premium: Money,
    pub premium_source: PremiumSource,
}

/// Ports used by [`QuoteService`]
#[derive(Clone)]
pub struct QuotePorts {
    pub credentials: Arc<dyn CredentialStore>,
    pub provider: Arc<dyn UnderwritingProvider>,
    pub records: Arc<dyn PolicyRecordRepository>,
    pub rentals: Arc<dyn RentalLedger>,
}

/// Obtains finalized quotes and records them as `Quoted` policy records
pub struct QuoteService {
    ports: QuotePorts,
    tokens: Arc<TokenCache>,
    calculator: PremiumCalculator,
}

impl QuoteService {
    pub fn new(ports: QuotePorts, tokens: Arc<TokenCache>, calculator: PremiumCalculator) -> Self {
        Self {
            ports,
            tokens,
            calculator,
        }
    }

    pub fn calculator(&self) -> &PremiumCalculator {
        &self.calculator
    }

    /// Creates a quote and persists its policy record
    ///
    /// Input is validated before any remote call, so a rejected request
    /// never leaves a record behind. The provider's premium is used when it
    /// returns a positive amount; otherwise the rate table prices the quote.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing coverage, renter fields, or a bad trip
    /// - `CredentialsNotConfigured` / `AuthenticationFailed` for tenant
    ///   account problems
    /// - `QuoteCreationFailed` when the provider rejects the quote or cannot
    ///   be reached
    #[instrument(
        skip(self, request),
        fields(rental_id = %request.rental_id, tenant_id = %request.tenant_id)
    )]
    pub async fn create_quote(&self, request: QuoteRequest) -> Result<QuoteResult, PolicyError> {
        if !request.coverage.any() {
            return Err(PolicyError::validation("at least one coverage must be selected"));
        }
        request.renter.validate_for_quote()?;
        request.trip.validate()?;

        let credentials = self.ports.credentials.get(request.tenant_id).await?;
        let session = ProviderSession::new(
            self.ports.provider.clone(),
            self.tokens.clone(),
            credentials,
        );

        let submission = QuoteSubmission::finalized(&request.trip, &request.coverage, &request.renter)?;
        let outcome = request_quote(&session, &submission).await?;

        let fallback = self
            .calculator
            .calculate(&request.coverage, request.trip.rental_days());
        let (premium, source) = choose_premium(&outcome, &fallback);
        info!(
            premium = %premium,
            premium_source = source.as_str(),
            rate_table_premium = %fallback.total,
            provider_premium = ?outcome.total_amount,
            "Premium determined"
        );

        let mut coverage_types = CoverageTypes::new(request.coverage);
        coverage_types.merge_documents(&outcome.documents);

        let record = PolicyRecord::quoted(
            NewPolicyRecord {
                rental_id: request.rental_id,
                tenant_id: request.tenant_id,
                customer_id: request.customer_id,
                quote_id: outcome.quote_id.clone(),
                payment_id: outcome.payment_id.clone(),
                coverage_types,
                trip: request.trip,
                premium_amount: premium,
                renter_details: request.renter,
            },
            Utc::now(),
        )?;
        self.ports.records.insert(&record).await?;

        if let Err(e) = self
            .ports
            .rentals
            .record_insurance_premium(request.rental_id, &premium)
            .await
        {
            warn!(error = %e, "Failed to write insurance premium back to the rental");
        }

        info!(
            policy_record_id = %record.id(),
            quote_id = %outcome.quote_id,
            has_payment_id = record.payment_id().is_some(),
            "Quote created"
        );

        Ok(QuoteResult {
            policy_record_id: record.id(),
            quote_id: outcome.quote_id,
            payment_id: record.payment_id().map(str::to_string),
            premium,
            premium_source: source,
        })
    }
}

/// Submits a finalized quote and unwraps the provider's answer
pub(crate) async fn request_quote(
    session: &ProviderSession,
    submission: &QuoteSubmission,
) -> Result<QuoteOutcome, PolicyError> {
    let response = session.create_quote(submission).await.map_err(|e| {
        e.into_policy_error(|transport| PolicyError::quote_failed(transport.to_string()))
    })?;

    let outcome = match response {
        ProviderResponse::Ok { data } => data,
        ProviderResponse::ProviderError { code, message } => {
            warn!(code, message = %message, "Provider rejected quote");
            return Err(PolicyError::QuoteCreationFailed {
                code: Some(code),
                message,
            });
        }
    };

    if outcome.quote_id.trim().is_empty() {
        return Err(PolicyError::quote_failed("provider returned no quote identifier"));
    }
    Ok(outcome)
}

fn choose_premium(outcome: &QuoteOutcome, fallback: &PremiumCalculation) -> (Money, PremiumSource) {
    match outcome.total_amount {
        Some(total) if total > rust_decimal::Decimal::ZERO => (
            Money::new(total, fallback.total.currency()).round_to_currency(),
            PremiumSource::Provider,
        ),
        _ => (fallback.total, PremiumSource::RateTable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageCode;
    use crate::premium::PremiumCalculator;
    use rust_decimal_macros::dec;

    fn outcome(total: Option<rust_decimal::Decimal>) -> QuoteOutcome {
        QuoteOutcome {
            quote_id: "Q-1".to_string(),
            payment_id: Some("P-1".to_string()),
            total_amount: total,
            documents: Default::default(),
        }
    }

    #[test]
    fn test_provider_premium_wins_when_positive() {
        let fallback = PremiumCalculator::default()
            .calculate(&CoverageSelection::of(&[CoverageCode::Cdw]), 1);
        let (premium, source) = choose_premium(&outcome(Some(dec!(30.10))), &fallback);
        assert_eq!(premium.amount(), dec!(30.10));
        assert_eq!(source, PremiumSource::Provider);
    }

    #[test]
    fn test_zero_or_missing_provider_premium_falls_back() {
        let fallback = PremiumCalculator::default()
            .calculate(&CoverageSelection::of(&[CoverageCode::Cdw]), 1);
        for total in [None, Some(dec!(0)), Some(dec!(-4))] {
            let (premium, source) = choose_premium(&outcome(total), &fallback);
            assert_eq!(premium.amount(), dec!(26.95));
            assert_eq!(source, PremiumSource::RateTable);
        }
    }
}
