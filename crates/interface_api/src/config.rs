//! API configuration
//!
//! Loaded from `API_`-prefixed environment variables; every field has a
//! default so a bare environment starts a local server.

use std::time::Duration;

use serde::Deserialize;

use domain_policy::PipelineSettings;
use infra_db::DatabaseConfig;
use infra_external::ProviderEndpoints;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Upper bound of the connection pool
    pub database_max_connections: u32,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    /// Underwriting provider base URL for tenants in test mode
    pub provider_test_url: String,
    /// Underwriting provider base URL for tenants in live mode
    pub provider_live_url: String,
    /// Deadline for every provider call
    pub provider_timeout_secs: u64,
    /// Lifetime of cached provider tokens
    pub token_ttl_secs: i64,
    /// Age after which a pending payment claim may be taken over
    pub payment_claim_lease_secs: i64,
    /// Re-reads of a record claimed by a concurrent confirmation
    pub settle_poll_attempts: u32,
    pub settle_poll_interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let pipeline = PipelineSettings::default();
        let endpoints = ProviderEndpoints::default();
        let database = DatabaseConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: database.url,
            database_max_connections: database.max_connections,
            log_level: "info".to_string(),
            log_json: false,
            provider_test_url: endpoints.test_url,
            provider_live_url: endpoints.live_url,
            provider_timeout_secs: endpoints.timeout.as_secs(),
            token_ttl_secs: pipeline.token_ttl_secs,
            payment_claim_lease_secs: pipeline.payment_claim_lease_secs,
            settle_poll_attempts: pipeline.settle_poll_attempts,
            settle_poll_interval_ms: pipeline.settle_poll_interval_ms,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            token_ttl_secs: self.token_ttl_secs,
            payment_claim_lease_secs: self.payment_claim_lease_secs,
            settle_poll_attempts: self.settle_poll_attempts,
            settle_poll_interval_ms: self.settle_poll_interval_ms,
        }
    }

    pub fn provider_endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints::new(self.provider_test_url.clone(), self.provider_live_url.clone())
            .with_timeout(Duration::from_secs(self.provider_timeout_secs))
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone()).max_connections(self.database_max_connections)
    }
}
