//! Request handlers

pub mod health;
pub mod policies;
pub mod quotes;
pub mod tenants;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use validator::Validate;

use crate::error::ApiError;

/// Unwraps a JSON body and runs its field validation
pub(crate) fn validated<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    let Json(request) = body?;
    request.validate()?;
    Ok(request)
}
