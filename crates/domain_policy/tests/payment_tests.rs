//! Payment Service Tests
//!
//! Covers the payment confirmation state machine end to end against the
//! in-memory ports.
//!
//! # Test Organization
//!
//! - `idempotence_tests` - repeated confirmation of an active record
//! - `balance_tests` - insufficient balance classification and notices
//! - `failure_tests` - hard failures and retries out of `Failed`
//! - `recovery_tests` - replaying the quote when the payment handle is lost
//! - `concurrency_tests` - claim races and stale claims
//! - `activation_tests` - activation writes that fail after payment is captured

mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use common::{renter, trip, Harness};
use core_kernel::{Currency, CustomerId, Money, PolicyRecordId, PortError, RentalId, TenantId};
use domain_policy::{
    capture_reason, PipelineSettings, CoverageCode, CoverageSelection, CoverageTypes, NewPolicyRecord, PaymentOutcome, PolicyError,
    PolicyRecord, PolicyRecordRepository, PolicyStatus, ProviderResponse,
};
use domain_policy::renter::{FALLBACK_PHONE, FALLBACK_STREET, FALLBACK_ZIP};
use rust_decimal_macros::dec;

// ============================================================================
// IDEMPOTENCE
// ============================================================================

mod idempotence_tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_activates_policy() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        assert_eq!(confirmation.status, PolicyStatus::Active);
        assert!(confirmation.policy_no.is_some());

        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::Active);
        assert_eq!(record.policy_no(), confirmation.policy_no.as_deref());
        assert_eq!(record.payment_reference(), Some("pi_1"));
        assert!(record.issued_at().is_some());
    }

    #[tokio::test]
    async fn test_second_confirmation_is_a_no_op() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;

        let first = h.payments.confirm_payment(id, "pi_1").await.unwrap();
        let second = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert_eq!(first.policy_no, second.policy_no);
        assert!(second.issued);
        assert_eq!(h.provider.payment_calls(), 1);
    }

    #[tokio::test]
    async fn test_amount_is_sent_as_fixed_decimal_string() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;

        h.payments.confirm_payment(id, "pi_1").await.unwrap();

        let payments = h.provider.submitted_payments().await;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, "141.39");
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let h = Harness::new().await;
        let result = h.payments.confirm_payment(PolicyRecordId::new(), "pi_1").await;
        assert!(matches!(result, Err(PolicyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_issuance_documents_are_persisted() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider
            .push_payment(Ok(ProviderResponse::ok(PaymentOutcome {
                policy_no: Some("POL-42".to_string()),
                policy_id: Some("8812".to_string()),
                documents: [
                    (CoverageCode::Cdw, "pdf-cdw".to_string()),
                    (CoverageCode::Rcli, "pdf-rcli".to_string()),
                ]
                .into_iter()
                .collect(),
            })))
            .await;

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert_eq!(confirmation.policy_no.as_deref(), Some("POL-42"));
        assert_eq!(confirmation.policy_id.as_deref(), Some("8812"));
        assert_eq!(confirmation.documents.len(), 2);
        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.coverage_types().documents.len(), 2);
    }
}

// ============================================================================
// INSUFFICIENT BALANCE
// ============================================================================

mod balance_tests {
    use super::*;

    #[tokio::test]
    async fn test_fifty_dollar_balance_blocks_141_39_premium() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.set_balance(Some(dec!(50.00))).await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        match result {
            Err(PolicyError::InsufficientBalance {
                observed_balance,
                required,
                ..
            }) => {
                assert_eq!(observed_balance, Some(dec!(50.00)));
                assert_eq!(required, dec!(141.39));
            }
            other => panic!("Expected InsufficientBalance, got {:?}", other),
        }

        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::InsufficientBalance);
        assert!(record.policy_no().is_none());
        assert!(record.failure_reason().unwrap_or_default().contains("Insufficient funds"));

        let notifications = h.inbox.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].observed_balance, Some(dec!(50.00)));
        assert_eq!(notifications[0].required_premium, dec!(141.39));
        assert_eq!(h.email.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_shortfall_notifies_once() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.set_balance(Some(dec!(50.00))).await;

        let first = h.payments.confirm_payment(id, "pi_1").await;
        let second = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(first, Err(PolicyError::InsufficientBalance { .. })));
        assert!(matches!(second, Err(PolicyError::InsufficientBalance { .. })));
        assert_eq!(h.inbox.notifications().await.len(), 1);
        assert_eq!(h.email.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_new_episode_notifies_again() {
        let h = Harness::new().await;
        let first_id = h.quoted_record().await;
        h.provider.set_balance(Some(dec!(50.00))).await;

        let _ = h.payments.confirm_payment(first_id, "pi_1").await;
        let _ = h.payments.confirm_payment(first_id, "pi_1").await;

        h.provider.set_balance(Some(dec!(1000.00))).await;
        let recovered = h.payments.confirm_payment(first_id, "pi_1").await.unwrap();
        assert!(recovered.issued);

        let second_id = h.quoted_record().await;
        h.provider.set_balance(Some(dec!(50.00))).await;
        let result = h.payments.confirm_payment(second_id, "pi_2").await;

        assert!(matches!(result, Err(PolicyError::InsufficientBalance { .. })));
        assert_eq!(h.inbox.notifications().await.len(), 2);
    }

    #[tokio::test]
    async fn test_balance_query_failure_does_not_block_payment() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.set_balance_unavailable(true).await;

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        assert_eq!(h.provider.balance_calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_with_funding_text_is_a_balance_problem() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider
            .push_payment(Err(PortError::connection("credit line exhausted")))
            .await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        match result {
            Err(PolicyError::InsufficientBalance { observed_balance, .. }) => {
                assert_eq!(observed_balance, None);
            }
            other => panic!("Expected InsufficientBalance, got {:?}", other),
        }
        assert_eq!(h.inbox.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn test_available_balance() {
        let h = Harness::new().await;
        h.provider.set_balance(Some(dec!(512.25))).await;

        let balance = h.payments.available_balance(h.tenant_id).await.unwrap();

        assert_eq!(balance, dec!(512.25));
    }

    #[tokio::test]
    async fn test_available_balance_unconfigured_tenant() {
        let h = Harness::new().await;
        let result = h.payments.available_balance(TenantId::new()).await;
        assert!(matches!(result, Err(PolicyError::CredentialsNotConfigured(_))));
    }
}

// ============================================================================
// HARD FAILURES
// ============================================================================

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_license_fails_without_notice() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider
            .push_payment(Ok(ProviderResponse::rejected(400, "invalid license")))
            .await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        match result {
            Err(PolicyError::PaymentFailed(message)) => assert_eq!(message, "invalid license"),
            other => panic!("Expected PaymentFailed, got {:?}", other),
        }
        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::Failed);
        assert_eq!(record.failure_reason(), Some("invalid license"));
        assert!(h.inbox.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_a_hard_failure() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider
            .push_payment(Err(PortError::Timeout {
                operation: "submit_payment".to_string(),
                duration_ms: 8000,
            }))
            .await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::PaymentFailed(_))));
        assert_eq!(h.records.record(id).await.unwrap().status(), PolicyStatus::Failed);
    }

    #[tokio::test]
    async fn test_success_without_policy_number_is_a_failure() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider
            .push_payment(Ok(ProviderResponse::ok(PaymentOutcome {
                policy_no: None,
                policy_id: Some("1".to_string()),
                documents: Default::default(),
            })))
            .await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::PaymentFailed(_))));
        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::Failed);
        assert!(record.policy_id().is_none());
    }

    #[tokio::test]
    async fn test_failed_record_can_be_retried() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider
            .push_payment(Ok(ProviderResponse::rejected(500, "upstream error")))
            .await;

        assert!(h.payments.confirm_payment(id, "pi_1").await.is_err());
        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        assert_eq!(h.provider.payment_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_marks_record_failed() {
        let h = Harness::new().await;
        let record = PolicyRecord::quoted(
            NewPolicyRecord {
                rental_id: RentalId::new(),
                tenant_id: TenantId::new(),
                customer_id: CustomerId::new(),
                quote_id: "Q-1".to_string(),
                payment_id: Some("PAY-1".to_string()),
                coverage_types: CoverageTypes::new(CoverageSelection::of(&[CoverageCode::Sli])),
                trip: trip(2),
                premium_amount: Money::new(dec!(27.90), Currency::USD),
                renter_details: renter(),
            },
            Utc::now(),
        )
        .unwrap();
        let id = record.id();
        h.records.insert(&record).await.unwrap();

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::CredentialsNotConfigured(_))));
        assert_eq!(h.records.record(id).await.unwrap().status(), PolicyStatus::Failed);
        assert_eq!(h.provider.payment_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_before_payment() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.reject_tokens(1).await;

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        assert_eq!(h.provider.auth_calls(), 2);
    }
}

// ============================================================================
// RECOVERY
// ============================================================================

mod recovery_tests {
    use super::*;

    async fn quoted_without_payment_handle(h: &Harness) -> PolicyRecordId {
        h.provider.set_quote_without_payment_id(true).await;
        let id = h.quoted_record().await;
        h.provider.set_quote_without_payment_id(false).await;
        assert!(h.records.record(id).await.unwrap().payment_id().is_none());
        id
    }

    #[tokio::test]
    async fn test_missing_handle_is_recovered_before_payment() {
        let h = Harness::new().await;
        let id = quoted_without_payment_handle(&h).await;

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        assert_eq!(h.provider.quote_calls(), 2);
        let record = h.records.record(id).await.unwrap();
        let payments = h.provider.submitted_payments().await;
        assert_eq!(record.payment_id(), Some(payments[0].payment_id.as_str()));
    }

    #[tokio::test]
    async fn test_recovered_handle_survives_payment_failure() {
        let h = Harness::new().await;
        let id = quoted_without_payment_handle(&h).await;
        h.provider
            .push_payment(Ok(ProviderResponse::rejected(400, "invalid license")))
            .await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::PaymentFailed(_))));
        let record = h.records.record(id).await.unwrap();
        assert!(record.payment_id().is_some());
        assert_eq!(record.status(), PolicyStatus::Failed);
    }

    #[tokio::test]
    async fn test_replay_uses_snapshot_with_fallback_defaults() {
        let h = Harness::new().await;
        let mut sparse = renter();
        sparse.address.street = None;
        sparse.address.zip = None;
        sparse.phone = None;
        let record = PolicyRecord::quoted(
            NewPolicyRecord {
                rental_id: RentalId::new(),
                tenant_id: h.tenant_id,
                customer_id: CustomerId::new(),
                quote_id: "Q-OLD".to_string(),
                payment_id: None,
                coverage_types: CoverageTypes::new(CoverageSelection::of(&[CoverageCode::Pai])),
                trip: trip(2),
                premium_amount: Money::new(dec!(13.90), Currency::USD),
                renter_details: sparse.clone(),
            },
            Utc::now(),
        )
        .unwrap();
        let id = record.id();
        h.records.insert(&record).await.unwrap();

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        let replayed = h.provider.submitted_quotes().await;
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].renter.street, FALLBACK_STREET);
        assert_eq!(replayed[0].renter.zip, FALLBACK_ZIP);
        assert_eq!(replayed[0].renter.phone, format!("1{}", FALLBACK_PHONE));
        assert_eq!(replayed[0].coverages, vec![CoverageCode::Pai]);

        let stored = h.records.record(id).await.unwrap();
        assert_eq!(stored.renter_details(), &sparse);
        assert_ne!(stored.quote_id(), Some("Q-OLD"));
    }

    #[tokio::test]
    async fn test_failed_replay_aborts_without_payment() {
        let h = Harness::new().await;
        let id = quoted_without_payment_handle(&h).await;
        h.provider
            .push_quote(Ok(ProviderResponse::rejected(410, "quote expired")))
            .await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        match result {
            Err(PolicyError::PaymentFailed(message)) => assert_eq!(message, "recovery failed"),
            other => panic!("Expected PaymentFailed, got {:?}", other),
        }
        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::Failed);
        assert!(record.payment_id().is_none());
        assert_eq!(h.provider.payment_calls(), 0);
    }

    #[tokio::test]
    async fn test_replay_without_payment_handle_is_not_guessed() {
        let h = Harness::new().await;
        let id = quoted_without_payment_handle(&h).await;
        h.provider.set_quote_without_payment_id(true).await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::PaymentFailed(_))));
        assert!(h.records.record(id).await.unwrap().payment_id().is_none());
        assert_eq!(h.provider.payment_calls(), 0);
    }

    #[tokio::test]
    async fn test_unpersisted_handle_aborts_payment() {
        let h = Harness::new().await;
        let id = quoted_without_payment_handle(&h).await;
        h.records.fail_handle_replacement(true).await;

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::PaymentFailed(_))));
        assert_eq!(h.provider.payment_calls(), 0);
    }
}

// ============================================================================
// CONCURRENCY
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_confirmations_pay_once() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.set_payment_delay(StdDuration::from_millis(100)).await;

        let (a, b) = tokio::join!(
            h.payments.confirm_payment(id, "webhook"),
            h.payments.confirm_payment(id, "browser"),
        );

        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.policy_no, b.policy_no);
        assert!(a.issued && b.issued);
        assert_eq!(h.provider.payment_calls(), 1);
    }

    #[tokio::test]
    async fn test_held_claim_reports_already_processing() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        let claimed = h
            .records
            .claim_for_payment(id, "other-worker", Duration::minutes(5), Utc::now())
            .await
            .unwrap();
        assert!(claimed.is_some());

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::AlreadyProcessing(_))));
        assert_eq!(h.provider.payment_calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_claim_is_taken_over() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.records
            .claim_for_payment(id, "crashed-worker", Duration::minutes(5), Utc::now() - Duration::minutes(30))
            .await
            .unwrap();

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.payment_reference(), Some("pi_1"));
    }

    #[tokio::test]
    async fn test_loser_sees_winner_shortfall() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.set_balance(Some(dec!(10.00))).await;
        h.provider.set_payment_delay(StdDuration::from_millis(100)).await;

        let (a, b) = tokio::join!(
            h.payments.confirm_payment(id, "webhook"),
            h.payments.confirm_payment(id, "browser"),
        );

        assert!(matches!(a, Err(PolicyError::InsufficientBalance { .. })));
        assert!(matches!(b, Err(PolicyError::InsufficientBalance { .. })));
        assert_eq!(h.provider.payment_calls(), 1);
        assert_eq!(h.inbox.notifications().await.len(), 1);
    }
}

// ============================================================================
// ACTIVATION
// ============================================================================

mod activation_tests {
    use super::*;

    fn immediate_takeover() -> PipelineSettings {
        PipelineSettings {
            payment_claim_lease_secs: 0,
            ..common::fast_settings()
        }
    }

    #[tokio::test]
    async fn test_transient_activation_failure_is_retried() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.records.fail_activations(1).await;

        let confirmation = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(confirmation.issued);
        assert_eq!(h.records.activation_attempts().await, 2);
        assert_eq!(h.provider.payment_calls(), 1);
        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::Active);
    }

    #[tokio::test]
    async fn test_captured_payment_is_never_charged_twice() {
        let h = Harness::with_settings(immediate_takeover()).await;
        let id = h.quoted_record().await;
        h.records.fail_activations(3).await;

        let first = h.payments.confirm_payment(id, "pi_1").await;

        let policy_no = match first {
            Err(PolicyError::PaymentFailed(message)) => {
                let record = h.records.record(id).await.unwrap();
                assert_eq!(record.status(), PolicyStatus::PaymentPending);
                let policy_no = record.policy_no().unwrap().to_string();
                assert_eq!(message, capture_reason(&policy_no));
                assert_eq!(record.failure_reason(), Some(message.as_str()));
                policy_no
            }
            other => panic!("Expected PaymentFailed, got {:?}", other),
        };
        assert_eq!(h.records.activation_attempts().await, 3);
        assert_eq!(h.provider.payment_calls(), 1);

        tokio::time::sleep(StdDuration::from_millis(5)).await;
        let second = h.payments.confirm_payment(id, "pi_1").await.unwrap();

        assert!(second.issued);
        assert_eq!(second.policy_no.as_deref(), Some(policy_no.as_str()));
        assert_eq!(h.provider.payment_calls(), 1);
        assert_eq!(h.provider.submitted_payments().await.len(), 1);

        let record = h.records.record(id).await.unwrap();
        assert_eq!(record.status(), PolicyStatus::Active);
        assert!(record.failure_reason().is_none());
    }

    #[tokio::test]
    async fn test_takeover_of_underfunded_attempt_does_not_notify_again() {
        let h = Harness::new().await;
        let id = h.quoted_record().await;
        h.provider.set_balance(Some(dec!(50.00))).await;

        let _ = h.payments.confirm_payment(id, "pi_1").await;
        assert_eq!(h.inbox.notifications().await.len(), 1);

        h.records
            .claim_for_payment(id, "crashed-worker", Duration::minutes(5), Utc::now() - Duration::minutes(30))
            .await
            .unwrap();

        let result = h.payments.confirm_payment(id, "pi_1").await;

        assert!(matches!(result, Err(PolicyError::InsufficientBalance { .. })));
        assert_eq!(h.provider.payment_calls(), 2);
        assert_eq!(h.inbox.notifications().await.len(), 1);
    }
}
