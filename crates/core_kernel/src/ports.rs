//! Port primitives
//!
//! The pipeline talks to PostgreSQL, the underwriting provider, and the
//! notification sinks only through port traits declared in
//! `domain_policy`. Every port extends [`DomainPort`] and reports failures
//! as [`PortError`], so services classify a dropped database connection
//! and a provider timeout the same way.
//!
//! ```text
//!   QuoteService / PaymentService / NotificationService
//!                        │
//!                  port traits (domain_policy::ports)
//!              ┌─────────┼──────────────┐
//!          infra_db   infra_external   ports::mock
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by an adapter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The request was well-formed but its content was rejected
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A guarded write found the row in another state, or a unique key clashed
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// Credentials or a bearer token were refused (HTTP 401/403)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// A response body could not be mapped onto domain types
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        PortError::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortError::Unauthorized { message: message.into() }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Failures where the remote side may not have seen the request at all
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker for every port trait; ports are shared across request tasks
pub trait DomainPort: Send + Sync + 'static {}

/// Adapter health as seen by the readiness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Answering, but slower than it should
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    /// Whether the adapter can take traffic (degraded still can)
    pub fn is_ready(&self) -> bool {
        self.status != AdapterHealth::Unhealthy
    }
}

#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
