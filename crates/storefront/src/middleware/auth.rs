//! Admin authentication extractors.
//!
//! The admin session lives entirely in the `Authorization: Bearer` header;
//! each request is verified on its own.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AuthError;
use crate::services::token::Claims;
use crate::state::AppState;

/// Extractor that requires a valid, unexpired admin token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(claims): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", claims.sub)
/// }
/// ```
pub struct RequireAdmin(pub Claims);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let claims = state
            .auth()
            .authenticate(token, chrono::Utc::now().timestamp())?;

        set_sentry_user(&claims.sub);
        tracing::Span::current().record("admin", claims.sub.as_str());

        Ok(Self(claims))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
