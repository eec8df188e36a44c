//! Shared harness for the pipeline service tests
//!
//! Wires the quote, payment, and notification services to the in-memory
//! ports from the `mock` feature.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{CustomerId, PolicyRecordId, RentalId, TenantId, UserId};
use domain_policy::{
    CoverageCode, CoverageSelection, DriverLicense, MockEmailDispatcher, MockNotificationInbox,
    MockPolicyRecordRepository, MockRentalLedger, MockTenantDirectory, MockUnderwritingProvider,
    NotificationService, PaymentPorts, PaymentService, PipelineSettings, PostalAddress,
    PremiumCalculator, ProviderMode, QuotePorts, QuoteRequest, QuoteService,
    RenterDetails, TenantAdmin, TenantBranding, TenantCredentials, TokenCache, TripDetails,
};

pub struct Harness {
    pub tenant_id: TenantId,
    pub directory: Arc<MockTenantDirectory>,
    pub provider: Arc<MockUnderwritingProvider>,
    pub records: Arc<MockPolicyRecordRepository>,
    pub rentals: Arc<MockRentalLedger>,
    pub inbox: Arc<MockNotificationInbox>,
    pub email: Arc<MockEmailDispatcher>,
    pub tokens: Arc<TokenCache>,
    pub notifications: Arc<NotificationService>,
    pub quotes: QuoteService,
    pub payments: PaymentService,
}

/// Settings with a short settle poll so loser tests finish quickly
pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        settle_poll_attempts: 6,
        settle_poll_interval_ms: 50,
        ..PipelineSettings::default()
    }
}

impl Harness {
    /// One tenant with credentials and a single administrator
    pub async fn new() -> Self {
        Self::with_settings(fast_settings()).await
    }

    pub async fn with_settings(settings: PipelineSettings) -> Self {
        let tenant_id = TenantId::new();
        let directory = Arc::new(MockTenantDirectory::new());
        directory
            .set_credentials(tenant_id, TenantCredentials::new("sunset", "s3cret", ProviderMode::Test))
            .await;
        directory
            .add_admin(
                tenant_id,
                TenantAdmin {
                    user_id: UserId::new(),
                    email: "ops@sunset.example".to_string(),
                    display_name: Some("Ops".to_string()),
                },
            )
            .await;
        directory
            .set_branding(
                tenant_id,
                TenantBranding {
                    tenant_name: "Sunset Rentals".to_string(),
                    support_email: Some("help@sunset.example".to_string()),
                    accent_color: "#ff6600".to_string(),
                },
            )
            .await;

        let provider = Arc::new(MockUnderwritingProvider::new());
        let records = Arc::new(MockPolicyRecordRepository::new());
        let rentals = Arc::new(MockRentalLedger::new());
        let inbox = Arc::new(MockNotificationInbox::new());
        let email = Arc::new(MockEmailDispatcher::new());
        let tokens = Arc::new(settings.token_cache());

        let notifications = Arc::new(NotificationService::new(
            directory.clone(),
            inbox.clone(),
            email.clone(),
        ));

        let quotes = QuoteService::new(
            QuotePorts {
                credentials: directory.clone(),
                provider: provider.clone(),
                records: records.clone(),
                rentals: rentals.clone(),
            },
            tokens.clone(),
            PremiumCalculator::default(),
        );

        let payments = PaymentService::new(
            PaymentPorts {
                credentials: directory.clone(),
                provider: provider.clone(),
                records: records.clone(),
            },
            tokens.clone(),
            notifications.clone(),
            PremiumCalculator::default(),
            settings,
        );

        Self {
            tenant_id,
            directory,
            provider,
            records,
            rentals,
            inbox,
            email,
            tokens,
            notifications,
            quotes,
            payments,
        }
    }

    /// Three-day trip with CDW and RCLI, priced at 141.39 by the rate table
    pub fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            rental_id: RentalId::new(),
            customer_id: CustomerId::new(),
            tenant_id: self.tenant_id,
            trip: trip(3),
            coverage: CoverageSelection::of(&[CoverageCode::Cdw, CoverageCode::Rcli]),
            renter: renter(),
        }
    }

    /// Creates a quoted record and returns its id
    pub async fn quoted_record(&self) -> PolicyRecordId {
        self.quotes
            .create_quote(self.quote_request())
            .await
            .expect("quote should succeed")
            .policy_record_id
    }
}

pub fn trip(days: i64) -> TripDetails {
    let start = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
    TripDetails::new(start, start + Duration::days(days), "FL")
}

pub fn renter() -> RenterDetails {
    RenterDetails {
        first_name: "Dana".to_string(),
        last_name: "Reyes".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        email: "dana@example.com".to_string(),
        phone: Some("(555) 201-3344".to_string()),
        address: PostalAddress {
            street: Some("12 Harbor Way".to_string()),
            city: "Tampa".to_string(),
            state: "FL".to_string(),
            zip: Some("33602".to_string()),
            country: "US".to_string(),
        },
        license: DriverLicense {
            number: "R123-456-78-901-0".to_string(),
            state: "FL".to_string(),
        },
    }
}
