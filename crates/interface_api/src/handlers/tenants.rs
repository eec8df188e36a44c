//! Tenant handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use core_kernel::TenantId;

use crate::dto::policy::BalanceResponse;
use crate::error::ApiError;
use crate::AppState;

/// Reads the tenant's prepaid balance at the underwriting provider
pub async fn provider_balance(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .payments
        .available_balance(TenantId::from_uuid(tenant_id))
        .await?;
    Ok(Json(BalanceResponse { tenant_id, balance }))
}
