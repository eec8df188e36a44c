//! Policy Record State Machine Tests
//!
//! # Test Organization
//!
//! - `transition_tests` - the full allowed/forbidden transition table
//! - `record_tests` - mutators enforcing record invariants

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, CustomerId, Money, RentalId, TenantId};
use domain_policy::{
    CoverageCode, CoverageSelection, CoverageTypes, DriverLicense, Issuance, NewPolicyRecord,
    PolicyError, PolicyRecord, PolicyStatus, PostalAddress, RenterDetails, TripDetails,
};
use rust_decimal_macros::dec;

const ALL_STATUSES: [PolicyStatus; 5] = [
    PolicyStatus::Quoted,
    PolicyStatus::PaymentPending,
    PolicyStatus::Active,
    PolicyStatus::InsufficientBalance,
    PolicyStatus::Failed,
];

fn new_record(payment_id: Option<&str>) -> NewPolicyRecord {
    let start = Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap();
    NewPolicyRecord {
        rental_id: RentalId::new(),
        tenant_id: TenantId::new(),
        customer_id: CustomerId::new(),
        quote_id: "Q-100".to_string(),
        payment_id: payment_id.map(str::to_string),
        coverage_types: CoverageTypes::new(CoverageSelection::of(&[CoverageCode::Rcli])),
        trip: TripDetails::new(start, start + Duration::days(2), "CA"),
        premium_amount: Money::new(dec!(40.36), Currency::USD),
        renter_details: RenterDetails {
            first_name: "Sam".to_string(),
            last_name: "Okafor".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 1, 30).unwrap(),
            email: "sam@example.com".to_string(),
            phone: Some("4155550100".to_string()),
            address: PostalAddress {
                street: Some("1 Market St".to_string()),
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                zip: Some("94105".to_string()),
                country: "US".to_string(),
            },
            license: DriverLicense {
                number: "D7654321".to_string(),
                state: "CA".to_string(),
            },
        },
    }
}

fn issuance() -> Issuance {
    Issuance {
        policy_no: "POL-1".to_string(),
        policy_id: Some("42".to_string()),
        documents: Default::default(),
        issued_at: Utc::now(),
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

mod transition_tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use PolicyStatus::*;
        let allowed = [
            (Quoted, PaymentPending),
            (InsufficientBalance, PaymentPending),
            (Failed, PaymentPending),
            (PaymentPending, PaymentPending),
            (PaymentPending, Active),
            (PaymentPending, InsufficientBalance),
            (PaymentPending, Failed),
        ];

        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {} should be {}",
                    from,
                    to,
                    if expected { "allowed" } else { "forbidden" }
                );
            }
        }
    }

    #[test]
    fn test_active_has_no_exits() {
        for to in ALL_STATUSES {
            assert!(PolicyStatus::Active.transition(to).is_err());
        }
    }

    #[test]
    fn test_claimable_states() {
        assert!(PolicyStatus::Quoted.is_claimable());
        assert!(PolicyStatus::InsufficientBalance.is_claimable());
        assert!(PolicyStatus::Failed.is_claimable());
        assert!(!PolicyStatus::PaymentPending.is_claimable());
        assert!(!PolicyStatus::Active.is_claimable());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&PolicyStatus::InsufficientBalance).unwrap();
        assert_eq!(json, "\"insufficient_balance\"");
        assert!("pending".parse::<PolicyStatus>().is_err());
    }
}

// ============================================================================
// RECORD INVARIANTS
// ============================================================================

mod record_tests {
    use super::*;

    #[test]
    fn test_negative_premium_is_rejected() {
        let mut new = new_record(Some("P-1"));
        new.premium_amount = Money::new(dec!(-1.00), Currency::USD);
        assert!(matches!(PolicyRecord::quoted(new, Utc::now()), Err(PolicyError::Validation(_))));
    }

    #[test]
    fn test_blank_quote_id_is_rejected() {
        let mut new = new_record(Some("P-1"));
        new.quote_id = "  ".to_string();
        assert!(PolicyRecord::quoted(new, Utc::now()).is_err());
    }

    #[test]
    fn test_activation_requires_payment_handle() {
        let now = Utc::now();
        let mut record = PolicyRecord::quoted(new_record(None), now).unwrap();
        record.begin_payment("pi_1", now).unwrap();

        assert!(record.activate(&issuance(), now).is_err());
        assert_eq!(record.status(), PolicyStatus::PaymentPending);
    }

    #[test]
    fn test_activation_requires_claim() {
        let now = Utc::now();
        let mut record = PolicyRecord::quoted(new_record(Some("P-1")), now).unwrap();

        let result = record.activate(&issuance(), now);

        assert!(matches!(result, Err(PolicyError::InvalidStateTransition { .. })));
        assert!(record.policy_no().is_none());
    }

    #[test]
    fn test_handles_replaced_only_while_pending() {
        let now = Utc::now();
        let mut record = PolicyRecord::quoted(new_record(None), now).unwrap();
        assert!(record
            .replace_quote_handles("Q-2".to_string(), "P-2".to_string(), now)
            .is_err());

        record.begin_payment("pi_1", now).unwrap();
        record
            .replace_quote_handles("Q-2".to_string(), "P-2".to_string(), now)
            .unwrap();

        assert_eq!(record.quote_id(), Some("Q-2"));
        assert_eq!(record.payment_id(), Some("P-2"));
    }

    #[test]
    fn test_fail_only_accepts_failure_states() {
        let now = Utc::now();
        let mut record = PolicyRecord::quoted(new_record(Some("P-1")), now).unwrap();
        record.begin_payment("pi_1", now).unwrap();

        assert!(record.fail(PolicyStatus::Active, "nope", now).is_err());
        record.fail(PolicyStatus::InsufficientBalance, "Insufficient funds", now).unwrap();

        assert_eq!(record.status(), PolicyStatus::InsufficientBalance);
        assert_eq!(record.failure_reason(), Some("Insufficient funds"));
    }

    #[test]
    fn test_activation_clears_failure_reason() {
        let now = Utc::now();
        let mut record = PolicyRecord::quoted(new_record(Some("P-1")), now).unwrap();
        record.begin_payment("pi_1", now).unwrap();
        record.fail(PolicyStatus::Failed, "upstream error", now).unwrap();

        let previous = record.begin_payment("pi_2", now).unwrap();
        record.activate(&issuance(), now).unwrap();

        assert_eq!(previous, PolicyStatus::Failed);
        assert!(record.failure_reason().is_none());
        assert_eq!(record.payment_reference(), Some("pi_2"));
        assert!(record.issued_at().is_some());
    }

    #[test]
    fn test_fresh_pending_claim_is_not_claimable() {
        let now = Utc::now();
        let mut record = PolicyRecord::quoted(new_record(Some("P-1")), now).unwrap();
        record.begin_payment("pi_1", now).unwrap();

        assert!(!record.can_claim(now + Duration::seconds(30), Duration::minutes(5)));
        assert!(record.can_claim(now + Duration::minutes(6), Duration::minutes(5)));
    }
}
