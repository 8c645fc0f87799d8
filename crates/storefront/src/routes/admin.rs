//! Inventory admin API.
//!
//! `POST /admin/login` trades credentials plus a Turnstile response for a
//! bearer token; every other endpoint here requires that token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use contraentrega_core::{Product, ProductId};

use super::ApiJson;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::middleware::rate_limit::ClientIp;
use crate::services::token::Claims;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Turnstile response token from the login form widget.
    #[serde(default)]
    pub cf_captcha: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST /admin/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: ProductId,
}

/// Result of an admin mutation.
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub success: bool,
    pub message: String,
}

impl AdminResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Log in as the inventory admin.
///
/// POST /admin/login
///
/// # Errors
///
/// Returns 401 for a failed challenge or wrong credentials, and 500 if the
/// challenge service cannot be reached.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let remote_ip = ip.map(|ip| ip.to_string());
    let token = state
        .auth()
        .login(
            &body.username,
            &body.password,
            &body.cf_captcha,
            remote_ip.as_deref(),
            chrono::Utc::now().timestamp(),
        )
        .await?;

    Ok(Json(LoginResponse { token }))
}

/// Return the verified token claims.
///
/// GET /admin/me
pub async fn me(RequireAdmin(claims): RequireAdmin) -> Json<Claims> {
    Json(claims)
}

/// Add a product.
///
/// POST /admin/add
///
/// # Errors
///
/// Returns 400 for invalid fields and 409 if the id is taken.
#[instrument(skip(state, _admin, product), fields(id = %product.id))]
pub async fn add(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiJson(product): ApiJson<Product>,
) -> Result<Json<AdminResponse>> {
    let created = state.catalog().create(product).await?;
    add_breadcrumb("admin", "product added", Some(&[("id", created.product.id.as_str())]));

    Ok(AdminResponse::ok(format!(
        "Producto {} agregado",
        created.product.id
    )))
}

/// Replace an existing product.
///
/// POST /admin/update
///
/// # Errors
///
/// Returns 400 for invalid fields and 404 if the id does not exist.
#[instrument(skip(state, _admin, product), fields(id = %product.id))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiJson(product): ApiJson<Product>,
) -> Result<Json<AdminResponse>> {
    let updated = state.catalog().update(product).await?;
    add_breadcrumb("admin", "product updated", Some(&[("id", updated.product.id.as_str())]));

    Ok(AdminResponse::ok(format!(
        "Producto {} actualizado",
        updated.product.id
    )))
}

/// Delete a product.
///
/// POST /admin/delete
///
/// # Errors
///
/// Returns 404 if the id does not exist.
#[instrument(skip(state, _admin, body), fields(id = %body.id))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiJson(body): ApiJson<DeleteRequest>,
) -> Result<Json<AdminResponse>> {
    state.catalog().delete(&body.id).await?;
    add_breadcrumb("admin", "product deleted", Some(&[("id", body.id.as_str())]));

    Ok(AdminResponse::ok(format!("Producto {} eliminado", body.id)))
}

/// Drop every catalog cache entry.
///
/// POST /admin/cache/flush
///
/// # Errors
///
/// Returns 500 if the cache cannot be cleared.
#[instrument(skip(state, _admin))]
pub async fn flush_cache(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<AdminResponse>> {
    state.catalog().flush().await?;
    Ok(AdminResponse::ok("Caché vaciada"))
}
