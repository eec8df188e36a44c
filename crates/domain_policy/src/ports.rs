//! Insurance Pipeline Ports
//!
//! Port traits for everything the pipeline needs from the outside world:
//! tenant configuration, the underwriting provider, policy record storage,
//! the rental ledger, and the notification sinks.
//!
//! # Adapters
//!
//! - **PostgreSQL** (`infra_db`): credentials, admins, policy records,
//!   rental premiums, in-app notifications, and the email outbox
//! - **HTTP** (`infra_external`): the underwriting provider
//! - **Mock** (this module, `mock` feature): in-memory implementations for
//!   tests
//!
//! ```rust,ignore
//! let quotes = QuoteService::new(QuotePorts {
//!     credentials: Arc::new(PostgresTenantAdapter::new(pool.clone())),
//!     provider: Arc::new(HttpUnderwritingProvider::new(endpoints)?),
//!     records: Arc::new(PostgresPolicyRecordAdapter::new(pool.clone())),
//!     rentals: Arc::new(PostgresRentalLedger::new(pool.clone())),
//! }, tokens, calculator);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    DomainPort, HealthCheckable, Money, NotificationId, PolicyRecordId, PortError, RentalId,
    TenantId, UserId,
};

use crate::aggregate::{Issuance, PolicyRecord, PolicyStatus};
use crate::auth::{ProviderMode, TenantCredentials};
use crate::error::PolicyError;
use crate::provider::{
    AuthGrant, BalanceOutcome, PaymentOutcome, PaymentSubmission, ProviderResponse, QuoteOutcome,
    QuoteSubmission,
};

// ============================================================================
// Tenant configuration
// ============================================================================

/// Resolves per-tenant underwriting credentials
#[async_trait]
pub trait CredentialStore: DomainPort {
    /// Returns the tenant's enabled credential set, if any
    async fn find_credentials(&self, tenant_id: TenantId) -> Result<Option<TenantCredentials>, PortError>;

    /// Returns the tenant's credentials or `CredentialsNotConfigured`
    async fn get(&self, tenant_id: TenantId) -> Result<TenantCredentials, PolicyError> {
        self.find_credentials(tenant_id)
            .await?
            .ok_or(PolicyError::CredentialsNotConfigured(tenant_id))
    }
}

/// A tenant administrator who receives operational notices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantAdmin {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Tenant branding used in outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBranding {
    pub tenant_name: String,
    pub support_email: Option<String>,
    pub accent_color: String,
}

impl Default for TenantBranding {
    fn default() -> Self {
        Self {
            tenant_name: "Your rental company".to_string(),
            support_email: None,
            accent_color: "#1f6feb".to_string(),
        }
    }
}

/// Looks up tenant administrators and branding
#[async_trait]
pub trait AdminDirectory: DomainPort {
    async fn admins(&self, tenant_id: TenantId) -> Result<Vec<TenantAdmin>, PortError>;

    async fn branding(&self, tenant_id: TenantId) -> Result<TenantBranding, PortError>;
}

// ============================================================================
// Underwriting provider
// ============================================================================

/// The remote underwriting API
///
/// Transport failures come back as `Err(PortError)`: HTTP 401/403 as
/// `Unauthorized`, elapsed deadlines as `Timeout`. Answers the provider
/// rejected inside its envelope come back as
/// `Ok(ProviderResponse::ProviderError)`.
#[async_trait]
pub trait UnderwritingProvider: DomainPort {
    async fn authenticate(
        &self,
        mode: ProviderMode,
        username: &str,
        password: &str,
    ) -> Result<ProviderResponse<AuthGrant>, PortError>;

    async fn create_quote(
        &self,
        mode: ProviderMode,
        token: &str,
        submission: &QuoteSubmission,
    ) -> Result<ProviderResponse<QuoteOutcome>, PortError>;

    async fn submit_payment(
        &self,
        mode: ProviderMode,
        token: &str,
        submission: &PaymentSubmission,
    ) -> Result<ProviderResponse<PaymentOutcome>, PortError>;

    async fn balance(
        &self,
        mode: ProviderMode,
        token: &str,
    ) -> Result<ProviderResponse<BalanceOutcome>, PortError>;
}

// ============================================================================
// Persistence
// ============================================================================

/// A record won by [`PolicyRecordRepository::claim_for_payment`]
#[derive(Debug, Clone)]
pub struct ClaimedRecord {
    /// The record, now in `PaymentPending`
    pub record: PolicyRecord,
    /// Status before the claim
    pub previous_status: PolicyStatus,
}

/// Storage for policy records
#[async_trait]
pub trait PolicyRecordRepository: DomainPort + HealthCheckable {
    async fn insert(&self, record: &PolicyRecord) -> Result<(), PortError>;

    async fn find(&self, id: PolicyRecordId) -> Result<Option<PolicyRecord>, PortError>;

    /// Atomically moves a claimable record to `PaymentPending`
    ///
    /// Succeeds for exactly one concurrent caller. A record is claimable in
    /// `Quoted`, `InsufficientBalance`, or `Failed`, or in `PaymentPending`
    /// when its last update is older than `lease`. Returns `None` when the
    /// record is missing or held by someone else.
    async fn claim_for_payment(
        &self,
        id: PolicyRecordId,
        payment_reference: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<ClaimedRecord>, PortError>;

    /// Replaces quote and payment handles after a recovered quote
    async fn replace_quote_handles(
        &self,
        id: PolicyRecordId,
        quote_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Stores the handles of a captured payment on a `PaymentPending`
    /// record that could not be activated
    ///
    /// Guarded so it only applies while no policy number is recorded.
    async fn record_capture(
        &self,
        id: PolicyRecordId,
        issuance: &Issuance,
        now: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Writes issuance handles and `Active` in one update
    async fn mark_active(&self, id: PolicyRecordId, issuance: &Issuance) -> Result<PolicyRecord, PortError>;

    /// Records a classified failure status and its reason
    async fn mark_unsuccessful(
        &self,
        id: PolicyRecordId,
        status: PolicyStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PortError>;
}

/// The booking side's rental records
#[async_trait]
pub trait RentalLedger: DomainPort {
    /// Writes the insurance premium onto the rental for checkout totals
    async fn record_insurance_premium(&self, rental_id: RentalId, premium: &Money) -> Result<(), PortError>;
}

// ============================================================================
// Notification sinks
// ============================================================================

/// Kind tag for low-balance notices
pub const INSUFFICIENT_BALANCE_KIND: &str = "insurance_insufficient_balance";

/// An in-app notice for one administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InAppNotification {
    pub id: NotificationId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub rental_id: RentalId,
    pub policy_record_id: PolicyRecordId,
    pub observed_balance: Option<Decimal>,
    pub required_premium: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A rendered email waiting for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub tenant_id: TenantId,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationInbox: DomainPort {
    async fn create(&self, notification: &InAppNotification) -> Result<(), PortError>;
}

/// Hands rendered email to the delivery system
#[async_trait]
pub trait EmailDispatcher: DomainPort {
    async fn enqueue(&self, email: &OutboundEmail) -> Result<(), PortError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    // ------------------------------------------------------------------------
    // Tenant configuration
    // ------------------------------------------------------------------------

    /// In-memory credentials, admins, and branding
    #[derive(Debug, Default)]
    pub struct MockTenantDirectory {
        credentials: RwLock<HashMap<TenantId, TenantCredentials>>,
        admins: RwLock<HashMap<TenantId, Vec<TenantAdmin>>>,
        branding: RwLock<HashMap<TenantId, TenantBranding>>,
    }

    impl MockTenantDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_credentials(&self, tenant_id: TenantId, credentials: TenantCredentials) {
            self.credentials.write().await.insert(tenant_id, credentials);
        }

        pub async fn add_admin(&self, tenant_id: TenantId, admin: TenantAdmin) {
            self.admins.write().await.entry(tenant_id).or_default().push(admin);
        }

        pub async fn set_branding(&self, tenant_id: TenantId, branding: TenantBranding) {
            self.branding.write().await.insert(tenant_id, branding);
        }
    }

    impl DomainPort for MockTenantDirectory {}

    #[async_trait]
    impl CredentialStore for MockTenantDirectory {
        async fn find_credentials(&self, tenant_id: TenantId) -> Result<Option<TenantCredentials>, PortError> {
            Ok(self.credentials.read().await.get(&tenant_id).cloned())
        }
    }

    #[async_trait]
    impl AdminDirectory for MockTenantDirectory {
        async fn admins(&self, tenant_id: TenantId) -> Result<Vec<TenantAdmin>, PortError> {
            Ok(self.admins.read().await.get(&tenant_id).cloned().unwrap_or_default())
        }

        async fn branding(&self, tenant_id: TenantId) -> Result<TenantBranding, PortError> {
            Ok(self.branding.read().await.get(&tenant_id).cloned().unwrap_or_default())
        }
    }

    // ------------------------------------------------------------------------
    // Underwriting provider
    // ------------------------------------------------------------------------

    type Scripted<T> = Result<ProviderResponse<T>, PortError>;

    #[derive(Debug, Default)]
    struct ProviderScript {
        auth_rejection: Option<String>,
        auth_delays: HashMap<String, std::time::Duration>,
        omit_token: bool,
        quotes: VecDeque<Scripted<QuoteOutcome>>,
        quote_total: Option<Decimal>,
        quote_without_payment_id: bool,
        payments: VecDeque<Scripted<PaymentOutcome>>,
        balance: Option<Decimal>,
        balance_unavailable: bool,
        reject_tokens: usize,
        payment_delay: Option<std::time::Duration>,
        submitted_quotes: Vec<QuoteSubmission>,
        submitted_payments: Vec<PaymentSubmission>,
    }

    /// Scriptable in-memory underwriting provider
    ///
    /// Without scripted answers it issues sequential tokens, quotes, and
    /// policies. When a balance is set, payments above it are rejected with
    /// an "Insufficient funds" message the way the real provider does.
    #[derive(Debug, Default)]
    pub struct MockUnderwritingProvider {
        script: RwLock<ProviderScript>,
        sequence: AtomicUsize,
        auth_calls: AtomicUsize,
        quote_calls: AtomicUsize,
        payment_calls: AtomicUsize,
        balance_calls: AtomicUsize,
    }

    impl MockUnderwritingProvider {
        pub fn new() -> Self {
            Self::default()
        }

        fn next(&self) -> usize {
            self.sequence.fetch_add(1, Ordering::SeqCst) + 1
        }

        /// Rejects credential exchanges with the given message
        pub async fn reject_credentials(&self, message: impl Into<String>) {
            self.script.write().await.auth_rejection = Some(message.into());
        }

        /// Delays credential exchanges for one username
        pub async fn set_auth_delay(&self, username: impl Into<String>, delay: std::time::Duration) {
            self.script.write().await.auth_delays.insert(username.into(), delay);
        }

        /// Answers credential exchanges with success but no token
        pub async fn omit_token(&self) {
            self.script.write().await.omit_token = true;
        }

        /// Fails the next `count` authenticated calls with HTTP 401
        pub async fn reject_tokens(&self, count: usize) {
            self.script.write().await.reject_tokens = count;
        }

        pub async fn push_quote(&self, response: Scripted<QuoteOutcome>) {
            self.script.write().await.quotes.push_back(response);
        }

        /// Premium returned by generated quotes
        pub async fn set_quote_total(&self, total: Option<Decimal>) {
            self.script.write().await.quote_total = total;
        }

        /// Generated quotes omit the payment handle
        pub async fn set_quote_without_payment_id(&self, omit: bool) {
            self.script.write().await.quote_without_payment_id = omit;
        }

        pub async fn push_payment(&self, response: Scripted<PaymentOutcome>) {
            self.script.write().await.payments.push_back(response);
        }

        pub async fn set_balance(&self, balance: Option<Decimal>) {
            self.script.write().await.balance = balance;
        }

        /// Balance queries fail in transport
        pub async fn set_balance_unavailable(&self, unavailable: bool) {
            self.script.write().await.balance_unavailable = unavailable;
        }

        /// Delays payment answers, widening race windows in tests
        pub async fn set_payment_delay(&self, delay: std::time::Duration) {
            self.script.write().await.payment_delay = Some(delay);
        }

        pub fn auth_calls(&self) -> usize {
            self.auth_calls.load(Ordering::SeqCst)
        }

        pub fn quote_calls(&self) -> usize {
            self.quote_calls.load(Ordering::SeqCst)
        }

        pub fn payment_calls(&self) -> usize {
            self.payment_calls.load(Ordering::SeqCst)
        }

        pub fn balance_calls(&self) -> usize {
            self.balance_calls.load(Ordering::SeqCst)
        }

        pub async fn submitted_quotes(&self) -> Vec<QuoteSubmission> {
            self.script.read().await.submitted_quotes.clone()
        }

        pub async fn submitted_payments(&self) -> Vec<PaymentSubmission> {
            self.script.read().await.submitted_payments.clone()
        }

        async fn check_token(&self) -> Result<(), PortError> {
            let mut script = self.script.write().await;
            if script.reject_tokens > 0 {
                script.reject_tokens -= 1;
                return Err(PortError::unauthorized("token expired"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockUnderwritingProvider {}

    #[async_trait]
    impl UnderwritingProvider for MockUnderwritingProvider {
        async fn authenticate(
            &self,
            _mode: ProviderMode,
            username: &str,
            _password: &str,
        ) -> Result<ProviderResponse<AuthGrant>, PortError> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.script.read().await.auth_delays.get(username).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let script = self.script.read().await;
            if let Some(message) = &script.auth_rejection {
                return Ok(ProviderResponse::rejected(401, message.clone()));
            }
            let token = (!script.omit_token).then(|| format!("{}-token-{}", username, self.next()));
            Ok(ProviderResponse::ok(AuthGrant { token }))
        }

        async fn create_quote(
            &self,
            _mode: ProviderMode,
            _token: &str,
            submission: &QuoteSubmission,
        ) -> Result<ProviderResponse<QuoteOutcome>, PortError> {
            self.check_token().await?;
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.write().await;
            script.submitted_quotes.push(submission.clone());
            if let Some(scripted) = script.quotes.pop_front() {
                return scripted;
            }
            let n = self.next();
            Ok(ProviderResponse::ok(QuoteOutcome {
                quote_id: format!("Q-{}", n),
                payment_id: (!script.quote_without_payment_id).then(|| format!("PAY-{}", n)),
                total_amount: script.quote_total,
                documents: Default::default(),
            }))
        }

        async fn submit_payment(
            &self,
            _mode: ProviderMode,
            _token: &str,
            submission: &PaymentSubmission,
        ) -> Result<ProviderResponse<PaymentOutcome>, PortError> {
            self.check_token().await?;
            self.payment_calls.fetch_add(1, Ordering::SeqCst);
            let (scripted, balance, delay) = {
                let mut script = self.script.write().await;
                script.submitted_payments.push(submission.clone());
                (script.payments.pop_front(), script.balance, script.payment_delay)
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(scripted) = scripted {
                return scripted;
            }

            let amount: Decimal = submission
                .amount
                .parse()
                .map_err(|_| PortError::validation(format!("bad amount '{}'", submission.amount)))?;
            if let Some(balance) = balance {
                if amount > balance {
                    return Ok(ProviderResponse::rejected(
                        402,
                        format!("Insufficient funds: balance {} is below {}", balance, amount),
                    ));
                }
            }

            let n = self.next();
            Ok(ProviderResponse::ok(PaymentOutcome {
                policy_no: Some(format!("POL-{}", n)),
                policy_id: Some(format!("{}", 9000 + n)),
                documents: Default::default(),
            }))
        }

        async fn balance(
            &self,
            _mode: ProviderMode,
            _token: &str,
        ) -> Result<ProviderResponse<BalanceOutcome>, PortError> {
            self.check_token().await?;
            self.balance_calls.fetch_add(1, Ordering::SeqCst);
            let script = self.script.read().await;
            if script.balance_unavailable {
                return Err(PortError::ServiceUnavailable {
                    service: "underwriting balance".to_string(),
                });
            }
            match script.balance {
                Some(balance) => Ok(ProviderResponse::ok(BalanceOutcome { balance })),
                None => Ok(ProviderResponse::rejected(404, "balance not available")),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// In-memory policy record store
    #[derive(Debug, Default)]
    pub struct MockPolicyRecordRepository {
        records: Arc<RwLock<HashMap<PolicyRecordId, PolicyRecord>>>,
        fail_replace: RwLock<bool>,
        failing_activations: RwLock<usize>,
        activation_attempts: RwLock<usize>,
    }

    impl MockPolicyRecordRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_records(records: Vec<PolicyRecord>) -> Self {
            let repo = Self::new();
            for record in records {
                repo.records.write().await.insert(record.id(), record);
            }
            repo
        }

        /// Current state of a stored record
        pub async fn record(&self, id: PolicyRecordId) -> Option<PolicyRecord> {
            self.records.read().await.get(&id).cloned()
        }

        pub async fn len(&self) -> usize {
            self.records.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.records.read().await.is_empty()
        }

        /// Makes handle replacement fail, simulating a write error
        pub async fn fail_handle_replacement(&self, fail: bool) {
            *self.fail_replace.write().await = fail;
        }

        /// Makes the next `count` activation writes fail
        pub async fn fail_activations(&self, count: usize) {
            *self.failing_activations.write().await = count;
        }

        /// Number of activation writes attempted so far
        pub async fn activation_attempts(&self) -> usize {
            *self.activation_attempts.read().await
        }
    }

    fn conflict(error: PolicyError) -> PortError {
        PortError::Conflict {
            message: error.to_string(),
        }
    }

    impl DomainPort for MockPolicyRecordRepository {}

    #[async_trait]
    impl HealthCheckable for MockPolicyRecordRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-policy-records".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PolicyRecordRepository for MockPolicyRecordRepository {
        async fn insert(&self, record: &PolicyRecord) -> Result<(), PortError> {
            let mut records = self.records.write().await;
            if records.contains_key(&record.id()) {
                return Err(PortError::Conflict {
                    message: format!("policy record {} already exists", record.id()),
                });
            }
            records.insert(record.id(), record.clone());
            Ok(())
        }

        async fn find(&self, id: PolicyRecordId) -> Result<Option<PolicyRecord>, PortError> {
            Ok(self.records.read().await.get(&id).cloned())
        }

        async fn claim_for_payment(
            &self,
            id: PolicyRecordId,
            payment_reference: &str,
            lease: Duration,
            now: DateTime<Utc>,
        ) -> Result<Option<ClaimedRecord>, PortError> {
            let mut records = self.records.write().await;
            let Some(record) = records.get_mut(&id) else {
                return Ok(None);
            };
            if !record.can_claim(now, lease) {
                return Ok(None);
            }
            let previous_status = record.begin_payment(payment_reference, now).map_err(conflict)?;
            Ok(Some(ClaimedRecord {
                record: record.clone(),
                previous_status,
            }))
        }

        async fn replace_quote_handles(
            &self,
            id: PolicyRecordId,
            quote_id: &str,
            payment_id: &str,
            now: DateTime<Utc>,
        ) -> Result<(), PortError> {
            if *self.fail_replace.read().await {
                return Err(PortError::connection("policy record store unavailable"));
            }
            let mut records = self.records.write().await;
            let record = records
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("PolicyRecord", id))?;
            record
                .replace_quote_handles(quote_id.to_string(), payment_id.to_string(), now)
                .map_err(conflict)
        }

        async fn record_capture(
            &self,
            id: PolicyRecordId,
            issuance: &Issuance,
            now: DateTime<Utc>,
        ) -> Result<(), PortError> {
            let mut records = self.records.write().await;
            let record = records
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("PolicyRecord", id))?;
            record.record_capture(issuance, now).map_err(conflict)
        }

        async fn mark_active(&self, id: PolicyRecordId, issuance: &Issuance) -> Result<PolicyRecord, PortError> {
            *self.activation_attempts.write().await += 1;
            {
                let mut failing = self.failing_activations.write().await;
                if *failing > 0 {
                    *failing -= 1;
                    return Err(PortError::connection("policy record store unavailable"));
                }
            }
            let mut records = self.records.write().await;
            let record = records
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("PolicyRecord", id))?;
            record.activate(issuance, issuance.issued_at).map_err(conflict)?;
            Ok(record.clone())
        }

        async fn mark_unsuccessful(
            &self,
            id: PolicyRecordId,
            status: PolicyStatus,
            reason: &str,
            now: DateTime<Utc>,
        ) -> Result<(), PortError> {
            let mut records = self.records.write().await;
            let record = records
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("PolicyRecord", id))?;
            record.fail(status, reason, now).map_err(conflict)
        }
    }

    /// In-memory rental premium ledger
    #[derive(Debug, Default)]
    pub struct MockRentalLedger {
        premiums: RwLock<HashMap<RentalId, Money>>,
        fail_writes: RwLock<bool>,
    }

    impl MockRentalLedger {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn premium_for(&self, rental_id: RentalId) -> Option<Money> {
            self.premiums.read().await.get(&rental_id).copied()
        }

        pub async fn fail_writes(&self, fail: bool) {
            *self.fail_writes.write().await = fail;
        }
    }

    impl DomainPort for MockRentalLedger {}

    #[async_trait]
    impl RentalLedger for MockRentalLedger {
        async fn record_insurance_premium(&self, rental_id: RentalId, premium: &Money) -> Result<(), PortError> {
            if *self.fail_writes.read().await {
                return Err(PortError::not_found("Rental", rental_id));
            }
            self.premiums.write().await.insert(rental_id, *premium);
            Ok(())
        }
    }

    // ------------------------------------------------------------------------
    // Notification sinks
    // ------------------------------------------------------------------------

    /// Collects in-app notifications
    #[derive(Debug, Default)]
    pub struct MockNotificationInbox {
        notifications: RwLock<Vec<InAppNotification>>,
    }

    impl MockNotificationInbox {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn notifications(&self) -> Vec<InAppNotification> {
            self.notifications.read().await.clone()
        }
    }

    impl DomainPort for MockNotificationInbox {}

    #[async_trait]
    impl NotificationInbox for MockNotificationInbox {
        async fn create(&self, notification: &InAppNotification) -> Result<(), PortError> {
            self.notifications.write().await.push(notification.clone());
            Ok(())
        }
    }

    /// Collects outgoing email
    #[derive(Debug, Default)]
    pub struct MockEmailDispatcher {
        sent: RwLock<Vec<OutboundEmail>>,
    }

    impl MockEmailDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn sent(&self) -> Vec<OutboundEmail> {
            self.sent.read().await.clone()
        }
    }

    impl DomainPort for MockEmailDispatcher {}

    #[async_trait]
    impl EmailDispatcher for MockEmailDispatcher {
        async fn enqueue(&self, email: &OutboundEmail) -> Result<(), PortError> {
            self.sent.write().await.push(email.clone());
            Ok(())
        }
    }
}
