//! Lightning recharge quote API.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::recharge::{self, RechargeQuote};
use crate::state::AppState;

/// Query parameters for a quote.
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    /// Pesos to convert.
    pub amount: i64,
}

/// Quote a recharge at the configured rate.
///
/// GET /api/recharge/quote?amount=30000
///
/// # Errors
///
/// Returns 400 for a missing or non-positive amount.
#[instrument(skip(state, params))]
pub async fn quote(
    State(state): State<AppState>,
    params: std::result::Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<RechargeQuote>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let quote = recharge::quote(
        params.amount,
        state.config().recharge.rate_cop_per_ksat,
        chrono::Utc::now().timestamp_millis(),
    )?;

    Ok(Json(quote))
}
