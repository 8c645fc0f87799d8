//! Durable product store contract and the in-memory implementation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use contraentrega_core::{Product, ProductId};

use crate::db::RepositoryError;

/// Authoritative product storage.
///
/// Implemented by [`crate::db::PgProductStore`] in production and by
/// [`MemoryProductStore`] in tests and local development.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, ordered by id.
    async fn all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A single product by primary key.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a new product.
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Replace the product with the same id. Returns `false` if none existed.
    async fn update(&self, product: &Product) -> Result<bool, RepositoryError>;

    /// Remove a product. Returns `false` if none existed.
    async fn delete(&self, id: &ProductId) -> Result<bool, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Product store held in process memory.
///
/// Can be switched offline to exercise outage handling.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<BTreeMap<ProductId, Product>>,
    offline: AtomicBool,
}

impl MemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self {
            products: RwLock::new(products),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the store going down (`true`) or coming back (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        self.check_online()?;
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.check_online()?;
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        self.check_online()?;
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, RepositoryError> {
        self.check_online()?;
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        self.check_online()?;
        Ok(self.products.write().await.remove(id).is_some())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_online()
    }
}
