//! Server-rendered pages.
//!
//! Pages carry no inline event handlers; each has one nonce-tagged script
//! block that wires up its controls.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use contraentrega_core::{DELIVERY_FEE, Price};

use crate::catalog::{CatalogError, CatalogProduct};
use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// Storefront page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nonce: String,
    pub products: Vec<CatalogProduct>,
    /// Catalog as JSON, safe to embed in a `<script>` block.
    pub products_json: String,
    pub delivery_fee: Price,
}

/// Recharge page template.
#[derive(Template, WebTemplate)]
#[template(path = "recharge.html")]
pub struct RechargeTemplate {
    pub nonce: String,
    pub rate_cop_per_ksat: u64,
}

/// Legal agreement page template.
#[derive(Template, WebTemplate)]
#[template(path = "agreement.html")]
pub struct AgreementTemplate {
    pub nonce: String,
}

/// Inventory admin page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/inventory.html")]
pub struct AdminTemplate {
    pub nonce: String,
    pub turnstile_site_key: String,
}

/// Display the storefront.
///
/// An empty catalog renders an empty product table rather than an error.
///
/// # Errors
///
/// Returns 500 if the durable store cannot be read.
#[instrument(skip(state, nonce))]
pub async fn home(State(state): State<AppState>, nonce: CspNonce) -> Result<HomeTemplate> {
    let products = match state.catalog().list().await {
        Ok(products) => products,
        Err(CatalogError::Empty) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    Ok(HomeTemplate {
        nonce: nonce.0,
        products_json: script_json(&products)?,
        products,
        delivery_fee: DELIVERY_FEE,
    })
}

/// Display the Lightning recharge page.
#[instrument(skip(state, nonce))]
pub async fn recharge(State(state): State<AppState>, nonce: CspNonce) -> RechargeTemplate {
    RechargeTemplate {
        nonce: nonce.0,
        rate_cop_per_ksat: state.config().recharge.rate_cop_per_ksat,
    }
}

/// Display the service agreement.
pub async fn agreement(nonce: CspNonce) -> AgreementTemplate {
    AgreementTemplate { nonce: nonce.0 }
}

/// Display the inventory admin.
#[instrument(skip(state, nonce))]
pub async fn admin(State(state): State<AppState>, nonce: CspNonce) -> AdminTemplate {
    AdminTemplate {
        nonce: nonce.0,
        turnstile_site_key: state.config().turnstile.site_key.clone(),
    }
}

/// Serialize `value` for embedding inside `<script>`.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).map_err(CatalogError::from)?;
    Ok(json.replace("</", "<\\/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_script_json_escapes_closing_tags() {
        let json = script_json(&vec!["</script><script>alert(1)</script>"]).unwrap();
        assert!(!json.contains("</"));
        assert!(json.contains("<\\/script>"));
    }
}
