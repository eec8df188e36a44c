//! Quote handlers

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use tracing::info;

use crate::dto::quote::{
    CreateQuoteRequest, PremiumEstimateRequest, PremiumEstimateResponse, QuoteResponse,
};
use crate::error::ApiError;
use crate::handlers::validated;
use crate::AppState;

/// Creates a finalized provider quote and its `Quoted` policy record
pub async fn create_quote(
    State(state): State<AppState>,
    body: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QuoteResponse>), ApiError> {
    let request = validated(body)?;
    let result = state.quotes.create_quote(request.into()).await?;

    info!(
        policy_record_id = %result.policy_record_id,
        premium = %result.premium,
        "Quote created"
    );

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// Prices a coverage selection from the rate table without calling the provider
pub async fn estimate_premium(
    State(state): State<AppState>,
    body: Result<Json<PremiumEstimateRequest>, JsonRejection>,
) -> Result<Json<PremiumEstimateResponse>, ApiError> {
    let Json(request) = body?;
    let trip = request.trip();
    trip.validate_window()?;

    let calculation = state
        .calculator
        .calculate(&request.coverage, trip.rental_days());
    Ok(Json(calculation.into()))
}
