//! Insurance pipeline errors
//!
//! This module defines the error taxonomy reported by the quote and payment
//! services. Remote failures are classified before they reach this type, so
//! callers can tell "the tenant's provider account is underfunded" apart
//! from a hard failure.

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MoneyError, PolicyRecordId, PortError, TenantId};

use crate::aggregate::PolicyStatus;

/// Errors that can occur in the rental insurance pipeline
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Tenant has no underwriting provider account configured
    #[error("Underwriting provider credentials are not configured for tenant {0}")]
    CredentialsNotConfigured(TenantId),

    /// Provider rejected the tenant's credentials
    #[error("Authentication with underwriting provider failed: {0}")]
    AuthenticationFailed(String),

    /// Provider rejected the quote or could not be reached
    #[error("Quote creation failed: {message}")]
    QuoteCreationFailed {
        code: Option<i64>,
        message: String,
    },

    /// Payment submission failed for a reason other than provider funding
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// Provider account balance is too low to activate the policy
    #[error("Insufficient provider balance: {message}")]
    InsufficientBalance {
        message: String,
        observed_balance: Option<Decimal>,
        required: Decimal,
    },

    /// Provider could not answer a diagnostic query
    #[error("Underwriting provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Notification copy could not be rendered or dispatched
    #[error("Notification error: {0}")]
    Notification(String),

    /// Input rejected before any remote call or persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid state transition attempted on a policy record
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: PolicyStatus,
        to: PolicyStatus,
    },

    /// Policy record not found
    #[error("Policy record not found: {0}")]
    NotFound(PolicyRecordId),

    /// Another request currently holds the payment claim on the record
    #[error("Policy record {0} is already being processed")]
    AlreadyProcessing(PolicyRecordId),

    /// Persistence or adapter failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),

    /// Financial calculation error
    #[error("Financial error: {0}")]
    Financial(#[from] MoneyError),
}

impl PolicyError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PolicyError::Validation(message.into())
    }

    /// Creates a quote failure without a provider code
    pub fn quote_failed(message: impl Into<String>) -> Self {
        PolicyError::QuoteCreationFailed {
            code: None,
            message: message.into(),
        }
    }

    /// Returns true if a later retry can succeed without operator changes
    /// to the request or configuration
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PolicyError::InsufficientBalance { .. } | PolicyError::AlreadyProcessing(_)
        )
    }

    /// Short machine-readable code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::CredentialsNotConfigured(_) => "credentials_not_configured",
            PolicyError::AuthenticationFailed(_) => "authentication_failed",
            PolicyError::QuoteCreationFailed { .. } => "quote_creation_failed",
            PolicyError::PaymentFailed(_) => "payment_failed",
            PolicyError::InsufficientBalance { .. } => "insufficient_balance",
            PolicyError::ProviderUnavailable(_) => "provider_unavailable",
            PolicyError::Notification(_) => "notification_error",
            PolicyError::Validation(_) => "validation_error",
            PolicyError::InvalidStateTransition { .. } => "invalid_state_transition",
            PolicyError::NotFound(_) => "not_found",
            PolicyError::AlreadyProcessing(_) => "already_processing",
            PolicyError::Persistence(_) => "persistence_error",
            PolicyError::Financial(_) => "financial_error",
        }
    }
}
