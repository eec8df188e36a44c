//! Policy record handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use uuid::Uuid;

use core_kernel::PolicyRecordId;

use crate::dto::policy::{ConfirmPaymentRequest, PaymentResponse, PolicyResponse};
use crate::error::ApiError;
use crate::handlers::validated;
use crate::AppState;

/// Confirms payment for a quoted record and issues the policy
///
/// Safe to call again for the same record: an issued policy answers with
/// its stored confirmation.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ConfirmPaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let request = validated(body)?;
    let confirmation = state
        .payments
        .confirm_payment(PolicyRecordId::from_uuid(id), &request.payment_reference)
        .await?;
    Ok(Json(confirmation.into()))
}

/// Gets a policy record by id
pub async fn get_policy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let record = state
        .records
        .find(PolicyRecordId::from_uuid(id))
        .await
        .map_err(domain_policy::PolicyError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Policy record {} not found", id)))?;
    Ok(Json(PolicyResponse::from(&record)))
}
