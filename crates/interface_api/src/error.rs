//! API error handling
//!
//! Every failure leaves the API as `{error, message, retryable, details}`.
//! Pipeline errors keep their machine-readable code from
//! [`PolicyError::code`]; provider funding problems answer
//! `402 Payment Required` so checkout can tell them apart from hard
//! failures.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_policy::{PolicyError, PolicyStatus};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Policy(error) => policy_status(error),
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Policy(error) => ErrorResponse {
                error: error.code().to_string(),
                message: error.to_string(),
                retryable: error.is_retryable(),
                details: policy_details(error),
            },
            other => {
                let error = match other {
                    ApiError::NotFound(_) => "not_found",
                    ApiError::BadRequest(_) => "bad_request",
                    ApiError::Validation(_) => "validation_error",
                    ApiError::Unavailable(_) => "service_unavailable",
                    _ => "internal_error",
                };
                ErrorResponse {
                    error: error.to_string(),
                    message: other.to_string(),
                    retryable: matches!(other, ApiError::Unavailable(_)),
                    details: None,
                }
            }
        }
    }
}

fn policy_status(error: &PolicyError) -> StatusCode {
    match error {
        PolicyError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        PolicyError::CredentialsNotConfigured(_) => StatusCode::PRECONDITION_FAILED,
        PolicyError::AuthenticationFailed(_)
        | PolicyError::QuoteCreationFailed { .. }
        | PolicyError::PaymentFailed(_)
        | PolicyError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
        PolicyError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PolicyError::NotFound(_) => StatusCode::NOT_FOUND,
        PolicyError::AlreadyProcessing(_) | PolicyError::InvalidStateTransition { .. } => {
            StatusCode::CONFLICT
        }
        PolicyError::Persistence(port) => match port {
            PortError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortError::Conflict { .. } => StatusCode::CONFLICT,
            PortError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            p if p.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        PolicyError::Notification(_) | PolicyError::Financial(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn policy_details(error: &PolicyError) -> Option<Value> {
    match error {
        PolicyError::InsufficientBalance {
            observed_balance,
            required,
            ..
        } => Some(json!({
            "issued": false,
            "status": PolicyStatus::InsufficientBalance,
            "observed_balance": observed_balance,
            "required_premium": required,
        })),
        PolicyError::PaymentFailed(_) => Some(json!({
            "issued": false,
            "status": PolicyStatus::Failed,
        })),
        PolicyError::QuoteCreationFailed { code: Some(code), .. } => Some(json!({
            "provider_code": code,
        })),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
