//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{CatalogService, KvStore, ProductStore};
use crate::config::StorefrontConfig;
use crate::services::{
    AdminAuthService, AdminCredentials, ChallengeVerifier, OrderRelay, OrderService, TokenSigner,
};

/// External collaborators the storefront talks to.
///
/// Production wires Postgres, moka, Turnstile and Formspree; tests swap in
/// in-memory stores and stubs.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn ProductStore>,
    pub cache: Arc<dyn KvStore>,
    pub challenge: Arc<dyn ChallengeVerifier>,
    pub relay: Option<Arc<dyn OrderRelay>>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog, admin authentication, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    auth: AdminAuthService,
    orders: OrderService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `backends` - Stores and upstream clients
    #[must_use]
    pub fn new(config: StorefrontConfig, backends: Backends) -> Self {
        let catalog = CatalogService::new(
            backends.store,
            backends.cache,
            config.catalog.image_base_url.clone(),
        );
        let auth = AdminAuthService::new(
            AdminCredentials::from(&config.admin),
            TokenSigner::new(config.admin.token_secret.clone()),
            backends.challenge,
        );
        let orders = OrderService::new(catalog.clone(), backends.relay);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                auth,
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the admin authentication service.
    #[must_use]
    pub fn auth(&self) -> &AdminAuthService {
        &self.inner.auth
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
