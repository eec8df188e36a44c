//! Provider endpoint configuration

use std::time::Duration;

use domain_policy::ProviderMode;

/// Default per-request deadline for provider calls
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 8;

/// Base URLs for the provider's sandbox and production environments
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub test_url: String,
    pub live_url: String,
    pub timeout: Duration,
}

impl ProviderEndpoints {
    pub fn new(test_url: impl Into<String>, live_url: impl Into<String>) -> Self {
        Self {
            test_url: test_url.into(),
            live_url: live_url.into(),
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL for a tenant's provider mode, without a trailing slash
    pub fn base_url(&self, mode: ProviderMode) -> &str {
        let url = match mode {
            ProviderMode::Test => &self.test_url,
            ProviderMode::Live => &self.live_url,
        };
        url.trim_end_matches('/')
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self::new(
            "https://sandbox.underwriting.example.com/api/v1",
            "https://underwriting.example.com/api/v1",
        )
    }
}
