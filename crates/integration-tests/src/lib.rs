//! Integration test harness for the Contraentrega CO storefront.
//!
//! Each [`TestContext`] serves the real router on an ephemeral port, backed
//! by the in-memory product store, the moka cache and stubbed upstreams, and
//! talks to it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p contraentrega-integration-tests
//! ```
//!
//! No database or network access is needed.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;

use contraentrega_core::{Price, Product, ProductId};
use contraentrega_storefront::catalog::{MemoryProductStore, MokaKvStore};
use contraentrega_storefront::config::{
    AdminConfig, AdminPassword, CatalogConfig, RechargeConfig, StorefrontConfig, TurnstileConfig,
};
use contraentrega_storefront::models::PricedOrder;
use contraentrega_storefront::services::{
    ChallengeError, ChallengeVerifier, OrderRelay, RelayError, TokenSigner,
};
use contraentrega_storefront::{AppState, Backends, RateLimiting, app};

pub const ADMIN_USERNAME: &str = "tienda";
pub const ADMIN_PASSWORD: &str = "cafe-con-leche-2026";
pub const TOKEN_SECRET: &str = "k9$Qw2!vB7@zX4#mN8^pL3&rT6*yU1%e";
pub const IMAGE_BASE_URL: &str = "https://img.contraentrega.test/";
/// Challenge response the stub verifier accepts.
pub const GOOD_CHALLENGE: &str = "turnstile-ok";

/// Storefront configuration with test secrets and no relay.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost".to_string(),
        catalog: CatalogConfig {
            image_base_url: IMAGE_BASE_URL.to_string(),
            cache_capacity: 1_000,
        },
        admin: AdminConfig {
            username: ADMIN_USERNAME.to_string(),
            password: AdminPassword::Plain(SecretString::from(ADMIN_PASSWORD)),
            token_secret: SecretString::from(TOKEN_SECRET),
        },
        turnstile: TurnstileConfig {
            site_key: "1x00000000000000000000AA".to_string(),
            secret_key: SecretString::from("1x0000000000000000000000000000000AA"),
        },
        formspree: None,
        recharge: RechargeConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Token signer sharing the test secret, for forging tokens in tests.
#[must_use]
pub fn test_signer() -> TokenSigner {
    TokenSigner::new(SecretString::from(TOKEN_SECRET))
}

/// Build a product; panics on invalid input.
#[must_use]
pub fn product(id: &str, name: &str, price: i64, stock: u32) -> Product {
    Product {
        id: ProductId::normalize(id).unwrap(),
        name: name.to_string(),
        price: Price::new(price).unwrap(),
        stock,
        image: format!("{}.jpg", id.trim_start_matches('@')),
    }
}

/// Challenge verifier that accepts only [`GOOD_CHALLENGE`].
#[derive(Default)]
pub struct StubChallenge {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ChallengeVerifier for StubChallenge {
    async fn verify(
        &self,
        response: &str,
        _remote_ip: Option<&str>,
    ) -> Result<bool, ChallengeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(response == GOOD_CHALLENGE)
    }
}

/// Order relay that records order ids, or fails when `fail` is set.
#[derive(Default)]
pub struct RecordingRelay {
    pub orders: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl OrderRelay for RecordingRelay {
    async fn relay(&self, order: &PricedOrder) -> Result<(), RelayError> {
        if self.fail {
            return Err(RelayError::Api {
                status: 503,
                message: "inbox unavailable".to_string(),
            });
        }
        self.orders.lock().unwrap().push(order.order_id.clone());
        Ok(())
    }
}

/// Options for [`TestContext::start`].
pub struct TestOptions {
    pub products: Vec<Product>,
    pub relay: Option<Arc<RecordingRelay>>,
    pub rate_limiting: RateLimiting,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            relay: None,
            rate_limiting: RateLimiting::Disabled,
        }
    }
}

/// A running storefront plus handles on its in-memory backends.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub store: Arc<MemoryProductStore>,
    pub cache: Arc<MokaKvStore>,
    pub challenge: Arc<StubChallenge>,
}

impl TestContext {
    /// Start a storefront with an empty catalog and no relay.
    pub async fn new() -> Self {
        Self::start(TestOptions::default()).await
    }

    /// Start a storefront with the given catalog.
    pub async fn with_products(products: Vec<Product>) -> Self {
        Self::start(TestOptions {
            products,
            ..TestOptions::default()
        })
        .await
    }

    /// Start a storefront on an ephemeral port.
    pub async fn start(options: TestOptions) -> Self {
        let store = Arc::new(MemoryProductStore::with_products(options.products));
        let cache = Arc::new(MokaKvStore::new(1_000));
        let challenge = Arc::new(StubChallenge::default());

        let backends = Backends {
            store: store.clone(),
            cache: cache.clone(),
            challenge: challenge.clone(),
            relay: options
                .relay
                .map(|relay| relay as Arc<dyn OrderRelay>),
        };
        let router = app(AppState::new(test_config(), backends), options.rate_limiting);

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            store,
            cache,
            challenge,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post_authed(&self, path: &str, token: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// POST /admin/login with the given credentials.
    pub async fn login_with(&self, username: &str, password: &str, challenge: &str) -> Response {
        self.post_json(
            "/admin/login",
            &serde_json::json!({
                "username": username,
                "password": password,
                "cf_captcha": challenge,
            }),
        )
        .await
    }

    /// Log in with the test credentials and return the bearer token.
    pub async fn login(&self) -> String {
        let resp = self
            .login_with(ADMIN_USERNAME, ADMIN_PASSWORD, GOOD_CHALLENGE)
            .await;
        assert_eq!(resp.status(), 200, "login failed");
        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

/// Current time in seconds, as used for token expiry.
#[must_use]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
