//! Rental Insurance Pipeline Domain
//!
//! This crate takes a renter's coverage selection through quoting, payment,
//! and issuance with a third-party underwriting provider.
//!
//! # Components
//!
//! - [`PremiumCalculator`]: fallback premium from a daily rate table
//! - [`TokenCache`] / [`ProviderSession`]: per-tenant provider tokens
//! - [`QuoteService`]: finalized quote, `Quoted` policy record
//! - [`PaymentService`]: idempotent payment confirmation with handle
//!   recovery and failure classification
//! - [`NotificationService`]: low-balance notices for tenant administrators
//! - [`PolicyRecord`]: the persisted attempt and its state machine
//!
//! # Failure handling
//!
//! Provider rejections are classified by [`classify`]: funding problems
//! leave the record in `InsufficientBalance` (retryable once the tenant
//! tops up), everything else in `Failed`.
//!
//! ```rust
//! use domain_policy::{CoverageCode, CoverageSelection, PremiumCalculator};
//! use rust_decimal_macros::dec;
//!
//! let calculator = PremiumCalculator::default();
//! let selection = CoverageSelection::of(&[CoverageCode::Cdw, CoverageCode::Rcli]);
//! let premium = calculator.calculate(&selection, 3);
//!
//! assert_eq!(premium.total.amount(), dec!(141.39));
//! ```

pub mod aggregate;
pub mod auth;
pub mod classification;
pub mod coverage;
pub mod error;
pub mod normalize;
pub mod ports;
pub mod premium;
pub mod provider;
pub mod renter;
pub mod services;
pub mod trip;

pub use aggregate::{capture_reason, Issuance, NewPolicyRecord, PolicyRecord, PolicyRecordParts, PolicyStatus};
pub use auth::{
    ProviderCallError, ProviderMode, ProviderSession, TenantCredentials, TokenCache,
    TokenCacheEntry,
};
pub use classification::{classify, FailureClass};
pub use coverage::{CoverageCode, CoverageSelection, CoverageTypes, DocumentHandles};
pub use error::PolicyError;
pub use ports::{
    AdminDirectory, ClaimedRecord, CredentialStore, EmailDispatcher, InAppNotification,
    NotificationInbox, OutboundEmail, PolicyRecordRepository, RentalLedger, TenantAdmin,
    TenantBranding, UnderwritingProvider, INSUFFICIENT_BALANCE_KIND,
};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{
    MockEmailDispatcher, MockNotificationInbox, MockPolicyRecordRepository, MockRentalLedger,
    MockTenantDirectory, MockUnderwritingProvider,
};
pub use premium::{PremiumCalculation, PremiumCalculator, RateTable};
pub use provider::{
    AuthGrant, BalanceOutcome, PaymentOutcome, PaymentSubmission, ProviderRejection,
    ProviderRenter, ProviderResponse, QuoteOutcome, QuoteSubmission,
};
pub use renter::{DriverLicense, PostalAddress, RenterDetails};
pub use services::{
    NotificationReport, NotificationService, PaymentConfirmation, PaymentPorts, PaymentService,
    PipelineSettings, PremiumSource, QuotePorts, QuoteRequest, QuoteResult, QuoteService,
};
pub use trip::TripDetails;
