//! Public catalog API.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::catalog::CatalogProduct;
use crate::error::Result;
use crate::state::AppState;

/// List every product.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 404 when the durable store has no products and 500 when it
/// cannot be read.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CatalogProduct>>> {
    Ok(Json(state.catalog().list().await?))
}

/// Show a single product by id, with or without the `@` prefix.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>> {
    Ok(Json(state.catalog().get(&id).await?))
}
