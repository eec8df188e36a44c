//! Underwriting provider HTTP adapter
//!
//! Implements [`UnderwritingProvider`] over the provider's JSON API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | authenticate | `POST {base}/auth/token` |
//! | create_quote | `POST {base}/quotes` (Bearer) |
//! | submit_payment | `POST {base}/payments` (Bearer) |
//! | balance | `GET {base}/account/balance` (Bearer) |
//!
//! The base URL is chosen per call from the tenant's [`ProviderMode`].
//! Every request runs under the configured deadline.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use core_kernel::{DomainPort, PortError};
use domain_policy::{
    AuthGrant, BalanceOutcome, PaymentOutcome, PaymentSubmission, ProviderMode, ProviderResponse,
    QuoteOutcome, QuoteSubmission, UnderwritingProvider,
};

use crate::config::ProviderEndpoints;
use crate::wire::{
    auth_grant, balance_outcome, payment_outcome, quote_outcome, Envelope, WireAuthData,
    WireBalanceData, WireCredentials, WirePaymentData, WirePaymentRequest, WireQuoteData,
    WireQuoteRequest,
};

const SERVICE_NAME: &str = "underwriting provider";

/// reqwest-backed underwriting provider
#[derive(Debug, Clone)]
pub struct HttpUnderwritingProvider {
    client: Client,
    endpoints: ProviderEndpoints,
}

impl HttpUnderwritingProvider {
    /// Builds the HTTP client with the endpoints' request deadline
    pub fn new(endpoints: ProviderEndpoints) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(endpoints.timeout)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build provider HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    fn url(&self, mode: ProviderMode, path: &str) -> String {
        format!("{}{}", self.endpoints.base_url(mode), path)
    }

    /// Sends a request and decodes the provider envelope
    ///
    /// On authenticated calls HTTP 401/403 becomes `PortError::Unauthorized`
    /// so the session can refresh the token and retry.
    async fn exchange<W, U>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        authenticated: bool,
        map: impl FnOnce(Option<W>) -> Result<U, PortError>,
    ) -> Result<ProviderResponse<U>, PortError>
    where
        W: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| self.transport_error(operation, e))?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), "Provider answered");

        if authenticated && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(PortError::unauthorized(format!(
                "{} rejected the access token (HTTP {})",
                SERVICE_NAME,
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(operation, e))?;

        match serde_json::from_slice::<Envelope<W>>(&body) {
            Ok(envelope) => envelope.decode(map),
            Err(_) if status.is_server_error() => {
                warn!(operation, status = status.as_u16(), "Provider returned a server error");
                Err(PortError::ServiceUnavailable {
                    service: SERVICE_NAME.to_string(),
                })
            }
            Err(e) => Err(PortError::transformation(format!(
                "{} returned an unreadable {} response (HTTP {}): {}",
                SERVICE_NAME,
                operation,
                status.as_u16(),
                e
            ))),
        }
    }

    fn transport_error(&self, operation: &'static str, error: reqwest::Error) -> PortError {
        if error.is_timeout() {
            warn!(operation, "Provider call timed out");
            PortError::Timeout {
                operation: operation.to_string(),
                duration_ms: self.endpoints.timeout.as_millis() as u64,
            }
        } else {
            let error = error.without_url();
            warn!(operation, error = %error, "Provider call failed in transport");
            PortError::Connection {
                message: format!("{} {} failed: {}", SERVICE_NAME, operation, error),
                source: Some(Box::new(error)),
            }
        }
    }
}

impl DomainPort for HttpUnderwritingProvider {}

#[async_trait]
impl UnderwritingProvider for HttpUnderwritingProvider {
    #[instrument(skip(self, password), fields(mode = %mode))]
    async fn authenticate(
        &self,
        mode: ProviderMode,
        username: &str,
        password: &str,
    ) -> Result<ProviderResponse<AuthGrant>, PortError> {
        let request = self
            .client
            .post(self.url(mode, "/auth/token"))
            .json(&WireCredentials { username, password });
        self.exchange::<WireAuthData, _>("authenticate", request, false, auth_grant)
            .await
    }

    #[instrument(skip(self, token, submission), fields(mode = %mode))]
    async fn create_quote(
        &self,
        mode: ProviderMode,
        token: &str,
        submission: &QuoteSubmission,
    ) -> Result<ProviderResponse<QuoteOutcome>, PortError> {
        let request = self
            .client
            .post(self.url(mode, "/quotes"))
            .bearer_auth(token)
            .json(&WireQuoteRequest::from(submission));
        self.exchange::<WireQuoteData, _>("create_quote", request, true, quote_outcome)
            .await
    }

    #[instrument(skip(self, token, submission), fields(mode = %mode, amount = %submission.amount))]
    async fn submit_payment(
        &self,
        mode: ProviderMode,
        token: &str,
        submission: &PaymentSubmission,
    ) -> Result<ProviderResponse<PaymentOutcome>, PortError> {
        let request = self
            .client
            .post(self.url(mode, "/payments"))
            .bearer_auth(token)
            .json(&WirePaymentRequest::from(submission));
        self.exchange::<WirePaymentData, _>("submit_payment", request, true, payment_outcome)
            .await
    }

    #[instrument(skip(self, token), fields(mode = %mode))]
    async fn balance(
        &self,
        mode: ProviderMode,
        token: &str,
    ) -> Result<ProviderResponse<BalanceOutcome>, PortError> {
        let request = self
            .client
            .get(self.url(mode, "/account/balance"))
            .bearer_auth(token);
        self.exchange::<WireBalanceData, _>("balance", request, true, balance_outcome)
            .await
    }
}
