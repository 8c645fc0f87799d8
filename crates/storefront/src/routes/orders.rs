//! Order submission.

use axum::{Json, extract::State};
use tracing::instrument;

use super::ApiJson;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequestId;
use crate::models::{OrderConfirmation, OrderRequest};
use crate::state::AppState;

/// Place an order from the storefront form.
///
/// POST /api/orders
///
/// # Errors
///
/// Returns 400 for invalid orders, 503 when no relay is configured and 502
/// when the relay fails.
#[instrument(skip(state, request_id, request), fields(items = request.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ApiJson(request): ApiJson<OrderRequest>,
) -> Result<Json<OrderConfirmation>> {
    let order = state
        .orders()
        .place(request, chrono::Utc::now().timestamp_millis())
        .await?;
    add_breadcrumb(
        "order",
        "order relayed",
        Some(&[("order_id", order.order_id.as_str()), ("request_id", request_id.as_str())]),
    );

    Ok(Json(OrderConfirmation::from(&order)))
}
