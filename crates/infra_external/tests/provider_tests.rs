//! Underwriting Provider HTTP Adapter Tests
//!
//! Runs the adapter against a wiremock server speaking the provider's
//! envelope format.
//!
//! # Test Organization
//!
//! - `envelope_tests` - success and rejection decoding per endpoint
//! - `transport_tests` - HTTP status, timeout, and malformed bodies
//! - `session_tests` - token caching and re-authentication end to end

use std::sync::Arc;
use std::time::Duration;

use core_kernel::PortError;
use domain_policy::{
    CoverageCode, PaymentSubmission, ProviderMode, ProviderRenter, ProviderResponse,
    ProviderSession, QuoteSubmission, TenantCredentials, TokenCache, UnderwritingProvider,
};
use infra_external::{HttpUnderwritingProvider, ProviderEndpoints};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> HttpUnderwritingProvider {
    let endpoints = ProviderEndpoints::new(format!("{}/sandbox", server.uri()), format!("{}/live", server.uri()))
        .with_timeout(Duration::from_millis(300));
    HttpUnderwritingProvider::new(endpoints).unwrap()
}

fn submission() -> QuoteSubmission {
    QuoteSubmission {
        finalize: true,
        coverages: vec![CoverageCode::Cdw, CoverageCode::Rcli],
        trip_start: "07/01/2024 10:00:00".to_string(),
        trip_end: "07/04/2024 10:00:00".to_string(),
        pickup_state: "Florida".to_string(),
        renter: ProviderRenter {
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            date_of_birth: "04/12/1990".to_string(),
            email: "dana@example.com".to_string(),
            phone: "15552013344".to_string(),
            street: "12 Harbor Way".to_string(),
            city: "Tampa".to_string(),
            state: "Florida".to_string(),
            zip: "33602".to_string(),
            country: "US".to_string(),
            license_number: "R123".to_string(),
            license_state: "Florida".to_string(),
        },
    }
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": 0, "txt": "OK", "data": data}))
}

fn rejection(status: i64, txt: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": status, "txt": txt, "data": null}))
}

// ============================================================================
// ENVELOPES
// ============================================================================

mod envelope_tests {
    use super::*;

    #[tokio::test]
    async fn test_authenticate_uses_mode_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/live/auth/token"))
            .and(body_partial_json(json!({"username": "sunset", "password": "s3cret"})))
            .respond_with(envelope(json!({"token": "tok-live"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .authenticate(ProviderMode::Live, "sunset", "s3cret")
            .await
            .unwrap();

        assert_eq!(response.into_result().unwrap().token.as_deref(), Some("tok-live"));
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/auth/token"))
            .respond_with(rejection(101, "Invalid username or password"))
            .mount(&server)
            .await;

        let response = provider(&server)
            .authenticate(ProviderMode::Test, "sunset", "wrong")
            .await
            .unwrap();

        let rejected = response.into_result().unwrap_err();
        assert_eq!(rejected.code, 101);
        assert_eq!(rejected.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_quote_request_and_response_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/quotes"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_partial_json(json!({
                "finalize": 1,
                "products": ["cdw", "rcli"],
                "trip": {"pickup_state": "Florida"},
                "renter": {"phone": "15552013344"}
            })))
            .respond_with(envelope(json!({
                "quote_id": 5501,
                "payment_id": "PAY-5501",
                "total_amount": "141.39",
                "pdfs": {"cdw": "doc-cdw"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider(&server)
            .create_quote(ProviderMode::Test, "tok-1", &submission())
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(outcome.quote_id, "5501");
        assert_eq!(outcome.payment_id.as_deref(), Some("PAY-5501"));
        assert_eq!(outcome.total_amount, Some(dec!(141.39)));
        assert_eq!(outcome.documents.get(&CoverageCode::Cdw).map(String::as_str), Some("doc-cdw"));
    }

    #[tokio::test]
    async fn test_payment_amount_travels_as_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/payments"))
            .and(body_partial_json(json!({"payment_id": "PAY-1", "amount": "141.39"})))
            .respond_with(envelope(json!({"policy_no": "POL-77", "policy_id": 9001})))
            .expect(1)
            .mount(&server)
            .await;

        let submission = PaymentSubmission {
            payment_id: "PAY-1".to_string(),
            amount: "141.39".to_string(),
        };
        let outcome = provider(&server)
            .submit_payment(ProviderMode::Test, "tok-1", &submission)
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(outcome.policy_no.as_deref(), Some("POL-77"));
        assert_eq!(outcome.policy_id.as_deref(), Some("9001"));
    }

    #[tokio::test]
    async fn test_payment_rejection_keeps_provider_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/payments"))
            .respond_with(rejection(402, "Insufficient funds in account"))
            .mount(&server)
            .await;

        let submission = PaymentSubmission {
            payment_id: "PAY-1".to_string(),
            amount: "141.39".to_string(),
        };
        let response = provider(&server)
            .submit_payment(ProviderMode::Test, "tok-1", &submission)
            .await
            .unwrap();

        match response {
            ProviderResponse::ProviderError { code, message } => {
                assert_eq!(code, 402);
                assert_eq!(message, "Insufficient funds in account");
            }
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_balance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandbox/account/balance"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(envelope(json!({"balance": "50.00"})))
            .mount(&server)
            .await;

        let balance = provider(&server)
            .balance(ProviderMode::Test, "tok-1")
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(balance.balance, dec!(50.00));
    }
}

// ============================================================================
// TRANSPORT
// ============================================================================

mod transport_tests {
    use super::*;

    #[tokio::test]
    async fn test_http_401_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sandbox/account/balance"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = provider(&server).balance(ProviderMode::Test, "stale").await;

        assert!(matches!(result, Err(PortError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/quotes"))
            .respond_with(envelope(json!({"quote_id": "Q-1"})).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let result = provider(&server)
            .create_quote(ProviderMode::Test, "tok-1", &submission())
            .await;

        match result {
            Err(PortError::Timeout { operation, duration_ms }) => {
                assert_eq!(operation, "create_quote");
                assert_eq!(duration_ms, 300);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/payments"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let submission = PaymentSubmission {
            payment_id: "PAY-1".to_string(),
            amount: "10.00".to_string(),
        };
        let result = provider(&server)
            .submit_payment(ProviderMode::Test, "tok-1", &submission)
            .await;

        assert!(matches!(result, Err(PortError::ServiceUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_success_without_data_is_a_transformation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/quotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0, "txt": "OK"})))
            .mount(&server)
            .await;

        let result = provider(&server)
            .create_quote(ProviderMode::Test, "tok-1", &submission())
            .await;

        assert!(matches!(result, Err(PortError::Transformation { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_a_connection_error() {
        let endpoints = ProviderEndpoints::new("http://127.0.0.1:9", "http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let provider = HttpUnderwritingProvider::new(endpoints).unwrap();

        let result = provider.balance(ProviderMode::Test, "tok-1").await;

        assert!(matches!(
            result,
            Err(PortError::Connection { .. }) | Err(PortError::Timeout { .. })
        ));
    }
}

// ============================================================================
// SESSION
// ============================================================================

mod session_tests {
    use super::*;

    fn session(server: &MockServer, tokens: Arc<TokenCache>) -> ProviderSession {
        ProviderSession::new(
            Arc::new(provider(server)),
            tokens,
            TenantCredentials::new("sunset", "s3cret", ProviderMode::Test),
        )
    }

    #[tokio::test]
    async fn test_token_is_fetched_once_and_reused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/auth/token"))
            .respond_with(envelope(json!({"token": "tok-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sandbox/account/balance"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(envelope(json!({"balance": 900})))
            .expect(2)
            .mount(&server)
            .await;

        let session = session(&server, Arc::new(TokenCache::default()));
        assert!(session.balance().await.unwrap().is_ok());
        assert!(session.balance().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_rejected_token_triggers_one_reauthentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sandbox/auth/token"))
            .respond_with(envelope(json!({"token": "tok-fresh"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sandbox/account/balance"))
            .and(header("authorization", "Bearer tok-stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sandbox/account/balance"))
            .and(header("authorization", "Bearer tok-fresh"))
            .respond_with(envelope(json!({"balance": "75.10"})))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(TokenCache::default());
        tokens
            .set("sunset", "tok-stale", chrono::Duration::minutes(10))
            .await;

        let balance = session(&server, tokens.clone())
            .balance()
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(balance.balance, dec!(75.10));
        assert_eq!(tokens.get("sunset").await.as_deref(), Some("tok-fresh"));
    }
}
