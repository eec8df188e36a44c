//! Payment confirmation
//!
//! Drives a quoted policy record to `Active`, `InsufficientBalance`, or
//! `Failed`. The entry point is safe to invoke repeatedly: an active record
//! short-circuits, and an atomic claim lets exactly one concurrent caller
//! submit payment.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use core_kernel::{PolicyRecordId, PortError, TenantId};

use crate::aggregate::{capture_reason, Issuance, PolicyRecord, PolicyStatus};
use crate::auth::{ProviderCallError, ProviderSession, TokenCache};
use crate::classification::{classify, FailureClass};
use crate::coverage::DocumentHandles;
use crate::error::PolicyError;
use crate::ports::{ClaimedRecord, CredentialStore, PolicyRecordRepository, UnderwritingProvider};
use crate::premium::PremiumCalculator;
use crate::provider::{PaymentSubmission, ProviderResponse, QuoteSubmission};
use crate::services::notification::NotificationService;
use crate::services::quote::request_quote;
use crate::services::PipelineSettings;

/// Attempts made to write an activation after the provider captured payment
const ACTIVATION_WRITE_ATTEMPTS: u32 = 3;
const ACTIVATION_RETRY_BACKOFF_MS: u64 = 100;

/// Result of a payment confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub policy_record_id: PolicyRecordId,
    pub policy_no: Option<String>,
    pub policy_id: Option<String>,
    pub issued: bool,
    pub status: PolicyStatus,
    pub documents: DocumentHandles,
}

impl PaymentConfirmation {
    pub fn from_record(record: &PolicyRecord) -> Self {
        Self {
            policy_record_id: record.id(),
            policy_no: record.policy_no().map(str::to_string),
            policy_id: record.policy_id().map(str::to_string),
            issued: record.is_issued(),
            status: record.status(),
            documents: record.coverage_types().documents.clone(),
        }
    }
}

/// Ports used by [`PaymentService`]
#[derive(Clone)]
pub struct PaymentPorts {
    pub credentials: Arc<dyn CredentialStore>,
    pub provider: Arc<dyn UnderwritingProvider>,
    pub records: Arc<dyn PolicyRecordRepository>,
}

/// Confirms payment for quoted policy records
pub struct PaymentService {
    ports: PaymentPorts,
    tokens: Arc<TokenCache>,
    notifications: Arc<NotificationService>,
    calculator: PremiumCalculator,
    settings: PipelineSettings,
}

impl PaymentService {
    pub fn new(
        ports: PaymentPorts,
        tokens: Arc<TokenCache>,
        notifications: Arc<NotificationService>,
        calculator: PremiumCalculator,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            ports,
            tokens,
            notifications,
            calculator,
            settings,
        }
    }

    /// Confirms payment and activates the policy
    ///
    /// # Flow
    ///
    /// 1. An `Active` record returns its stored confirmation
    /// 2. The record is claimed into `PaymentPending` before any remote call
    /// 3. A missing payment handle is recovered by replaying the stored quote
    /// 4. The provider balance is read for diagnostics
    /// 5. Payment is submitted; the result moves the record to `Active`,
    ///    `InsufficientBalance`, or `Failed`
    ///
    /// A record that already carries a captured payment skips straight to
    /// activation; payment is never submitted twice for it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - `AlreadyProcessing` if another caller holds the claim and does not
    ///   settle while this one waits
    /// - `InsufficientBalance` when the provider account is underfunded
    /// - `PaymentFailed` for every other payment or recovery failure, and
    ///   when a captured payment cannot be activated
    #[instrument(skip(self, payment_reference), fields(policy_record_id = %id))]
    pub async fn confirm_payment(
        &self,
        id: PolicyRecordId,
        payment_reference: &str,
    ) -> Result<PaymentConfirmation, PolicyError> {
        let record = self
            .ports
            .records
            .find(id)
            .await?
            .ok_or(PolicyError::NotFound(id))?;

        if record.is_issued() {
            info!(policy_no = ?record.policy_no(), "Policy already active, returning stored confirmation");
            return Ok(PaymentConfirmation::from_record(&record));
        }

        let claim = self
            .ports
            .records
            .claim_for_payment(id, payment_reference, self.settings.payment_claim_lease(), Utc::now())
            .await?;
        let Some(claim) = claim else {
            return self.await_settlement(id).await;
        };

        let previous_status = episode_status(&claim);
        let record = claim.record;
        info!(previous_status = %previous_status, tenant_id = %record.tenant_id(), "Claimed policy record for payment");

        if let Some(issuance) = record.captured_issuance() {
            info!(policy_no = %issuance.policy_no, "Payment already captured, finishing activation");
            return self.finish_activation(&record, issuance, true).await;
        }

        let credentials = match self.ports.credentials.get(record.tenant_id()).await {
            Ok(credentials) => credentials,
            Err(e) => {
                self.persist_failure(&record, PolicyStatus::Failed, &e.to_string()).await;
                return Err(e);
            }
        };
        let session = ProviderSession::new(self.ports.provider.clone(), self.tokens.clone(), credentials);

        let payment_id = match record.payment_id() {
            Some(payment_id) => payment_id.to_string(),
            None => self.recover_payment_handle(&session, &record).await?,
        };

        let observed_balance = self.observe_balance(&session).await;

        let submission = PaymentSubmission::new(payment_id, &record.premium_amount());
        let message = match session.submit_payment(&submission).await {
            Ok(ProviderResponse::Ok { data }) => {
                match data.policy_no.filter(|p| !p.trim().is_empty()) {
                    Some(policy_no) => {
                        let issuance = Issuance {
                            policy_no,
                            policy_id: data.policy_id,
                            documents: data.documents,
                            issued_at: Utc::now(),
                        };
                        return self.finish_activation(&record, issuance, false).await;
                    }
                    None => "provider confirmed payment without a policy number".to_string(),
                }
            }
            Ok(ProviderResponse::ProviderError { code, message }) => {
                warn!(code, message = %message, "Provider rejected payment");
                message
            }
            Err(ProviderCallError::Authentication(e)) => {
                self.persist_failure(&record, PolicyStatus::Failed, &e.to_string()).await;
                return Err(e);
            }
            Err(ProviderCallError::Transport(e)) => {
                warn!(error = %e, "Payment submission failed in transport");
                e.to_string()
            }
        };

        Err(self
            .settle_failure(&record, previous_status, message, observed_balance)
            .await)
    }

    /// Activates a record whose payment the provider has captured
    ///
    /// The write is retried a bounded number of times. If it still fails,
    /// the issuance handles are logged and stored as capture evidence so a
    /// later claim finishes activation instead of charging again.
    async fn finish_activation(
        &self,
        record: &PolicyRecord,
        issuance: Issuance,
        capture_recorded: bool,
    ) -> Result<PaymentConfirmation, PolicyError> {
        let error = match self.activate_with_retry(record.id(), &issuance).await {
            Ok(activated) => {
                info!(policy_no = %issuance.policy_no, "Policy activated");
                return Ok(PaymentConfirmation::from_record(&activated));
            }
            Err(e) => e,
        };

        error!(
            policy_no = %issuance.policy_no,
            policy_id = ?issuance.policy_id,
            error = %error,
            "Payment captured but activation could not be saved"
        );
        if !capture_recorded {
            if let Err(e) = self
                .ports
                .records
                .record_capture(record.id(), &issuance, Utc::now())
                .await
            {
                error!(
                    policy_no = %issuance.policy_no,
                    policy_id = ?issuance.policy_id,
                    error = %e,
                    "Failed to record captured payment, manual reconciliation required"
                );
            }
        }
        Err(PolicyError::PaymentFailed(capture_reason(&issuance.policy_no)))
    }

    async fn activate_with_retry(
        &self,
        id: PolicyRecordId,
        issuance: &Issuance,
    ) -> Result<PolicyRecord, PortError> {
        let mut attempt = 1;
        loop {
            match self.ports.records.mark_active(id, issuance).await {
                Ok(activated) => return Ok(activated),
                Err(e @ PortError::Conflict { .. }) => return Err(e),
                Err(e) if attempt < ACTIVATION_WRITE_ATTEMPTS => {
                    warn!(attempt, error = %e, "Activation write failed, retrying");
                    tokio::time::sleep(Duration::from_millis(ACTIVATION_RETRY_BACKOFF_MS * u64::from(attempt)))
                        .await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads the tenant's provider balance
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn available_balance(&self, tenant_id: TenantId) -> Result<Decimal, PolicyError> {
        let credentials = self.ports.credentials.get(tenant_id).await?;
        let session = ProviderSession::new(self.ports.provider.clone(), self.tokens.clone(), credentials);
        let response = session
            .balance()
            .await
            .map_err(|e| e.into_policy_error(|t| PolicyError::ProviderUnavailable(t.to_string())))?;

        match response {
            ProviderResponse::Ok { data } => Ok(data.balance),
            ProviderResponse::ProviderError { message, .. } => Err(PolicyError::ProviderUnavailable(message)),
        }
    }

    /// Replays the stored quote to obtain a fresh payment handle
    ///
    /// The new handles are persisted before payment is attempted. Any
    /// failure marks the record `Failed` and aborts with
    /// `PaymentFailed("recovery failed")`.
    async fn recover_payment_handle(
        &self,
        session: &ProviderSession,
        record: &PolicyRecord,
    ) -> Result<String, PolicyError> {
        warn!(quote_id = ?record.quote_id(), "Payment handle missing, replaying quote");

        let renter = record.renter_details().with_recovery_defaults();
        let selection = record.coverage_types().selection;
        let outcome = match QuoteSubmission::finalized(record.trip(), &selection, &renter) {
            Ok(submission) => request_quote(session, &submission).await,
            Err(e) => Err(e),
        };

        let recovered = outcome.and_then(|outcome| {
            let payment_id = outcome
                .payment_id
                .clone()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| PolicyError::quote_failed("replayed quote returned no payment handle"))?;
            Ok((outcome, payment_id))
        });

        let (outcome, payment_id) = match recovered {
            Ok(recovered) => recovered,
            Err(e) => {
                error!(error = %e, "Payment handle recovery failed");
                self.persist_failure(record, PolicyStatus::Failed, &format!("recovery failed: {}", e))
                    .await;
                return Err(PolicyError::PaymentFailed("recovery failed".to_string()));
            }
        };

        let rate_table = self
            .calculator
            .calculate(&selection, record.trip().rental_days());
        info!(
            recorded_premium = %record.premium_amount(),
            replayed_premium = ?outcome.total_amount,
            rate_table_premium = %rate_table.total,
            "Replayed quote priced"
        );

        if let Err(e) = self
            .ports
            .records
            .replace_quote_handles(record.id(), &outcome.quote_id, &payment_id, Utc::now())
            .await
        {
            error!(error = %e, "Failed to persist recovered payment handle");
            self.persist_failure(record, PolicyStatus::Failed, &format!("recovery failed: {}", e))
                .await;
            return Err(PolicyError::PaymentFailed("recovery failed".to_string()));
        }

        info!(quote_id = %outcome.quote_id, payment_id = %payment_id, "Recovered payment handle");
        Ok(payment_id)
    }

    /// Best-effort balance read; failures are logged and ignored
    async fn observe_balance(&self, session: &ProviderSession) -> Option<Decimal> {
        match session.balance().await {
            Ok(ProviderResponse::Ok { data }) => Some(data.balance),
            Ok(ProviderResponse::ProviderError { message, .. }) => {
                warn!(message = %message, "Provider balance query rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "Provider balance query failed");
                None
            }
        }
    }

    /// Classifies a payment failure, persists it, and notifies on the first
    /// underfunded attempt of an episode
    async fn settle_failure(
        &self,
        record: &PolicyRecord,
        previous_status: PolicyStatus,
        message: String,
        observed_balance: Option<Decimal>,
    ) -> PolicyError {
        let class = classify(&message);
        self.persist_failure(record, class.status(), &message).await;

        match class {
            FailureClass::InsufficientBalance => {
                warn!(
                    observed_balance = ?observed_balance,
                    required = %record.premium_amount(),
                    "Payment blocked by insufficient provider balance"
                );
                if previous_status != PolicyStatus::InsufficientBalance {
                    if let Err(e) = self
                        .notifications
                        .notify_insufficient_balance(record.tenant_id(), record, observed_balance)
                        .await
                    {
                        error!(error = %e, "Failed to notify tenant administrators");
                    }
                }
                PolicyError::InsufficientBalance {
                    message,
                    observed_balance,
                    required: record.premium_amount().amount(),
                }
            }
            FailureClass::Other => {
                error!(message = %message, "Payment failed");
                PolicyError::PaymentFailed(message)
            }
        }
    }

    async fn persist_failure(&self, record: &PolicyRecord, status: PolicyStatus, reason: &str) {
        if let Err(e) = self
            .ports
            .records
            .mark_unsuccessful(record.id(), status, reason, Utc::now())
            .await
        {
            error!(error = %e, status = %status, "Failed to persist payment failure");
        }
    }

    /// Waits for the caller holding the claim to settle the record
    async fn await_settlement(&self, id: PolicyRecordId) -> Result<PaymentConfirmation, PolicyError> {
        info!("Policy record is claimed by another request, waiting for it to settle");

        for _ in 0..self.settings.settle_poll_attempts {
            tokio::time::sleep(self.settings.settle_poll_interval()).await;

            let record = self
                .ports
                .records
                .find(id)
                .await?
                .ok_or(PolicyError::NotFound(id))?;

            match record.status() {
                PolicyStatus::Active => return Ok(PaymentConfirmation::from_record(&record)),
                PolicyStatus::InsufficientBalance => {
                    return Err(PolicyError::InsufficientBalance {
                        message: record.failure_reason().unwrap_or("insufficient balance").to_string(),
                        observed_balance: None,
                        required: record.premium_amount().amount(),
                    })
                }
                PolicyStatus::Failed => {
                    return Err(PolicyError::PaymentFailed(
                        record.failure_reason().unwrap_or("payment failed").to_string(),
                    ))
                }
                PolicyStatus::Quoted | PolicyStatus::PaymentPending => {}
            }
        }

        Err(PolicyError::AlreadyProcessing(id))
    }
}

/// Status that decides whether a failure starts a new underfunded episode
///
/// A stale claim takeover reports `PaymentPending`; the failure reason left
/// by the abandoned attempt still tells whether the record was underfunded.
fn episode_status(claim: &ClaimedRecord) -> PolicyStatus {
    match (claim.previous_status, claim.record.failure_reason()) {
        (PolicyStatus::PaymentPending, Some(reason))
            if classify(reason) == FailureClass::InsufficientBalance =>
        {
            PolicyStatus::InsufficientBalance
        }
        (previous, _) => previous,
    }
}
