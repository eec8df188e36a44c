//! Provider credentials, token caching, and authenticated sessions
//!
//! Authentication is the expensive provider operation, so tokens are cached
//! per credential identity with a TTL set below the provider's own token
//! lifetime. Each identity has its own lock: concurrent expirations for one
//! tenant trigger a single authentication, and one tenant's failure never
//! touches another tenant's entry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use core_kernel::PortError;

use crate::error::PolicyError;
use crate::ports::UnderwritingProvider;
use crate::provider::{
    BalanceOutcome, PaymentOutcome, PaymentSubmission, ProviderResponse, QuoteOutcome,
    QuoteSubmission,
};

/// Default token lifetime: 14 of the provider's 15 minutes
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 14 * 60;

/// Provider environment a tenant is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Test,
    Live,
}

impl ProviderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderMode::Test => "test",
            ProviderMode::Live => "live",
        }
    }

    /// Parses a stored mode, treating anything other than "live" as test
    pub fn from_stored(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("live") {
            ProviderMode::Live
        } else {
            ProviderMode::Test
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant's underwriting provider account
#[derive(Clone, PartialEq, Eq)]
pub struct TenantCredentials {
    pub username: String,
    password: String,
    pub mode: ProviderMode,
}

impl TenantCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>, mode: ProviderMode) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mode,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("mode", &self.mode)
            .finish()
    }
}

/// A cached provider token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCacheEntry {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenCacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

type Slot = Arc<Mutex<Option<TokenCacheEntry>>>;

/// Process-wide provider token cache with per-key locking
#[derive(Debug)]
pub struct TokenCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Returns the cached token for `key` if it has not expired
    pub async fn get(&self, key: &str) -> Option<String> {
        let slot = self.slot(key).await;
        let entry = slot.lock().await;
        entry
            .as_ref()
            .filter(|e| e.is_fresh(Utc::now()))
            .map(|e| e.token.clone())
    }

    /// Stores a token, replacing any previous entry for `key`
    pub async fn set(&self, key: &str, token: impl Into<String>, ttl: Duration) {
        let slot = self.slot(key).await;
        *slot.lock().await = Some(TokenCacheEntry {
            token: token.into(),
            expires_at: Utc::now() + ttl,
        });
    }

    /// Drops the entry for `key`
    pub async fn invalidate(&self, key: &str) {
        let slot = self.slot(key).await;
        *slot.lock().await = None;
    }

    /// Drops the entry for `key` only if it still holds `token`, so a token
    /// refreshed by a concurrent request survives
    pub async fn invalidate_token(&self, key: &str, token: &str) {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;
        if entry.as_ref().is_some_and(|e| e.token == token) {
            *entry = None;
        }
    }

    /// Returns a fresh cached token, or runs `authenticate` under the key's
    /// lock and caches its result
    pub async fn get_or_authenticate<F, Fut>(
        &self,
        key: &str,
        authenticate: F,
    ) -> Result<String, PolicyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, PolicyError>>,
    {
        let slot = self.slot(key).await;
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref().filter(|e| e.is_fresh(Utc::now())) {
            debug!(username = %key, "Using cached provider token");
            return Ok(cached.token.clone());
        }

        let token = authenticate().await?;
        *entry = Some(TokenCacheEntry {
            token: token.clone(),
            expires_at: Utc::now() + self.ttl,
        });
        Ok(token)
    }
}

/// Failure of an authenticated provider call
#[derive(Debug, Error)]
pub enum ProviderCallError {
    /// No token could be obtained
    #[error(transparent)]
    Authentication(PolicyError),

    /// The call itself failed in transport
    #[error(transparent)]
    Transport(#[from] PortError),
}

impl ProviderCallError {
    /// Converts into a domain error, leaving credential problems as they are
    pub fn into_policy_error(self, on_transport: impl FnOnce(PortError) -> PolicyError) -> PolicyError {
        match self {
            ProviderCallError::Authentication(e) => e,
            ProviderCallError::Transport(e) => on_transport(e),
        }
    }
}

/// One tenant's authenticated view of the provider
#[derive(Clone)]
pub struct ProviderSession {
    provider: Arc<dyn UnderwritingProvider>,
    tokens: Arc<TokenCache>,
    credentials: TenantCredentials,
}

impl ProviderSession {
    pub fn new(
        provider: Arc<dyn UnderwritingProvider>,
        tokens: Arc<TokenCache>,
        credentials: TenantCredentials,
    ) -> Self {
        Self {
            provider,
            tokens,
            credentials,
        }
    }

    pub fn mode(&self) -> ProviderMode {
        self.credentials.mode
    }

    pub fn provider(&self) -> &dyn UnderwritingProvider {
        self.provider.as_ref()
    }

    /// Returns a token for this tenant's credential identity
    pub async fn token(&self) -> Result<String, PolicyError> {
        let credentials = &self.credentials;
        let provider = &self.provider;
        self.tokens
            .get_or_authenticate(&credentials.username, || async move {
                debug!(username = %credentials.username, mode = %credentials.mode, "Authenticating with underwriting provider");
                let response = provider
                    .authenticate(credentials.mode, &credentials.username, credentials.password())
                    .await
                    .map_err(|e| PolicyError::AuthenticationFailed(e.to_string()))?;

                match response {
                    ProviderResponse::Ok { data } => data
                        .token
                        .filter(|t| !t.trim().is_empty())
                        .ok_or_else(|| {
                            PolicyError::AuthenticationFailed(
                                "provider reported success without a token".to_string(),
                            )
                        }),
                    ProviderResponse::ProviderError { message, .. } => {
                        Err(PolicyError::AuthenticationFailed(message))
                    }
                }
            })
            .await
    }

    /// Runs an authenticated provider call, re-authenticating once if the
    /// cached token is rejected
    pub async fn call<T, F, Fut>(&self, operation: &str, call: F) -> Result<ProviderResponse<T>, ProviderCallError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<ProviderResponse<T>, PortError>>,
    {
        let token = self.token().await.map_err(ProviderCallError::Authentication)?;

        match call(token.clone()).await {
            Err(e) if e.is_unauthorized() => {
                warn!(
                    username = %self.credentials.username,
                    operation,
                    "Provider rejected cached token, re-authenticating"
                );
                self.tokens
                    .invalidate_token(&self.credentials.username, &token)
                    .await;
                let fresh = self.token().await.map_err(ProviderCallError::Authentication)?;
                Ok(call(fresh).await?)
            }
            other => Ok(other?),
        }
    }

    pub async fn create_quote(
        &self,
        submission: &QuoteSubmission,
    ) -> Result<ProviderResponse<QuoteOutcome>, ProviderCallError> {
        let mode = self.mode();
        let provider = self.provider();
        self.call("create_quote", move |token| async move {
            provider.create_quote(mode, &token, submission).await
        })
        .await
    }

    pub async fn submit_payment(
        &self,
        submission: &PaymentSubmission,
    ) -> Result<ProviderResponse<PaymentOutcome>, ProviderCallError> {
        let mode = self.mode();
        let provider = self.provider();
        self.call("submit_payment", move |token| async move {
            provider.submit_payment(mode, &token, submission).await
        })
        .await
    }

    pub async fn balance(&self) -> Result<ProviderResponse<BalanceOutcome>, ProviderCallError> {
        let mode = self.mode();
        let provider = self.provider();
        self.call("balance", move |token| async move {
            provider.balance(mode, &token).await
        })
        .await
    }
}
