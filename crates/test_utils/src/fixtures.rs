//! Pre-built Test Fixtures
//!
//! Ready-to-use data for the rental insurance pipeline. The standard
//! fixtures are fixed and predictable; the `fake_*` variants draw names and
//! addresses from `fake` for tests that should not depend on specific
//! values.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use fake::faker::address::en::{CityName, StreetName, ZipCode};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money};
use domain_policy::{
    CoverageCode, CoverageSelection, DriverLicense, PostalAddress, ProviderMode, RenterDetails,
    TenantAdmin, TenantBranding, TenantCredentials, TripDetails,
};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// CDW + RCLI for three days at the standard rates
    pub fn usd_standard_premium() -> Money {
        Money::new(dec!(141.39), Currency::USD)
    }

    /// A provider balance too small for the standard premium
    pub fn usd_low_balance() -> Money {
        Money::new(dec!(50.00), Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }
}

/// Fixture for trip windows
pub struct TripFixtures;

impl TripFixtures {
    /// Standard pickup time (Jul 1, 2024 10:00 UTC)
    pub fn pickup() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    /// A trip of whole days picked up in Florida
    pub fn days(days: i64) -> TripDetails {
        let start = Self::pickup();
        TripDetails::new(start, start + Duration::days(days), "FL")
    }

    /// The standard three-day trip
    pub fn standard() -> TripDetails {
        Self::days(3)
    }
}

/// Fixture for coverage selections
pub struct CoverageFixtures;

impl CoverageFixtures {
    /// CDW and RCLI, the most common checkout combination
    pub fn standard() -> CoverageSelection {
        CoverageSelection::of(&[CoverageCode::Cdw, CoverageCode::Rcli])
    }

    pub fn all() -> CoverageSelection {
        CoverageSelection::of(&CoverageCode::ALL)
    }

    pub fn none() -> CoverageSelection {
        CoverageSelection::default()
    }
}

/// Fixture for renter snapshots
pub struct RenterFixtures;

impl RenterFixtures {
    /// A complete renter living in Tampa, FL
    pub fn standard() -> RenterDetails {
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

    /// A snapshot stored before street, ZIP, and phone were captured
    pub fn legacy() -> RenterDetails {
        let mut renter = Self::standard();
        renter.phone = None;
        renter.address.street = None;
        renter.address.zip = None;
        renter
    }

    /// A complete renter with randomized identity
    pub fn fake() -> RenterDetails {
        let mut renter = Self::standard();
        renter.first_name = FirstName().fake();
        renter.last_name = LastName().fake();
        renter.email = SafeEmail().fake();
        renter.address.street = Some(format!("{} {}", (1..999).fake::<u16>(), StreetName().fake::<String>()));
        renter.address.city = CityName().fake();
        renter.address.zip = Some(ZipCode().fake());
        renter
    }
}

/// Fixture for tenant configuration
pub struct TenantFixtures;

impl TenantFixtures {
    pub fn credentials() -> TenantCredentials {
        TenantCredentials::new("sunset", "s3cret", ProviderMode::Test)
    }

    pub fn live_credentials() -> TenantCredentials {
        TenantCredentials::new("sunset-live", "l1ve-s3cret", ProviderMode::Live)
    }

    pub fn branding() -> TenantBranding {
        TenantBranding {
            tenant_name: "Sunset Rentals".to_string(),
            support_email: Some("help@sunset.example".to_string()),
            accent_color: "#ff6600".to_string(),
        }
    }

    pub fn admin() -> TenantAdmin {
        TenantAdmin {
            user_id: core_kernel::UserId::new(),
            email: "ops@sunset.example".to_string(),
            display_name: Some("Ops".to_string()),
        }
    }
}
