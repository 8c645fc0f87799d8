//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Pages
//! GET  /                       - Storefront
//! GET  /index.html             - Storefront
//! GET  /recargar.html          - Lightning recharge
//! GET  /acuerdo.html           - Service agreement
//! GET  /admin                  - Inventory admin
//!
//! # Catalog API
//! GET  /api/products           - All products
//! GET  /api/products/{id}      - One product (`id` with or without `@`)
//!
//! # Orders and recharge
//! POST /api/orders             - Place an order (rate limited)
//! GET  /api/recharge/quote     - Recharge quote (`?amount=`)
//!
//! # Admin API (bearer token)
//! POST /admin/login            - Exchange credentials for a token (rate limited)
//! GET  /admin/me               - Verified token claims
//! POST /admin/add              - Add a product
//! POST /admin/update           - Replace a product
//! POST /admin/delete           - Delete a product
//! POST /admin/cache/flush      - Drop every catalog cache entry
//!
//! # Probes
//! GET  /health                 - Liveness
//! GET  /health/ready           - Product store reachability
//! ```

pub mod admin;
pub mod health;
pub mod orders;
pub mod pages;
pub mod products;
pub mod recharge;

use axum::{
    Router,
    body::Body,
    extract::{FromRequest, rejection::JsonRejection},
    http::Request,
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::{
    csp_nonce_middleware, login_rate_limiter, order_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// JSON body extractor whose rejections are `{"error": ...}` responses.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Whether per-IP rate limits are applied.
///
/// Limits key on the client IP, which in-process callers without a socket
/// or proxy headers do not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Enabled,
    Disabled,
}

/// Create the page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/index.html", get(pages::home))
        .route("/recargar.html", get(pages::recharge))
        .route("/acuerdo.html", get(pages::agreement))
        .route("/admin", get(pages::admin))
}

/// Create the catalog API routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", post(orders::create))
}

/// Create the admin login router, kept apart so it can be rate limited.
pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(admin::login))
}

/// Create the bearer-protected admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(admin::me))
        .route("/add", post(admin::add))
        .route("/update", post(admin::update))
        .route("/delete", post(admin::delete))
        .route("/cache/flush", post(admin::flush_cache))
}

/// Create all routes for the storefront.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let (mut login, mut orders) = (login_routes(), order_routes());
    if rate_limiting == RateLimiting::Enabled {
        login = login.layer(login_rate_limiter());
        orders = orders.layer(order_rate_limiter());
    }

    Router::new()
        .merge(page_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", orders)
        .route("/api/recharge/quote", get(recharge::quote))
        .nest("/admin", login.merge(admin_routes()))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Build the full application: routes, static files and middleware.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState, rate_limiting: RateLimiting) -> Router {
    Router::new()
        .merge(routes(rate_limiting))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(not_found)
        .layer(middleware::from_fn(csp_nonce_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                admin = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}
