//! Catalog read-through cache.
//!
//! # Read path
//!
//! Reads consult the fast store first and fall back to the durable store on
//! a miss, writing what they found back into the fast store with no expiry.
//! The list is cached under [`ALL_PRODUCTS_KEY`]; single products under their
//! canonical id (`@...`), which cannot collide with the aggregate key.
//!
//! Every served product carries `imageUrl`, the configured base URL joined
//! to the stored relative path. The decoration is never cached.
//!
//! # Write path
//!
//! Mutations hit the durable store first, then rewrite or drop the per-item
//! entry, then drop the aggregate entry. The steps are not transactional:
//! if the aggregate invalidation fails, the list keeps serving the
//! pre-mutation item while the item entry already holds the new one, until
//! the next mutation or a [`CatalogService::flush`].

pub mod kv;
pub mod store;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use contraentrega_core::{Product, ProductError, ProductId};

use crate::db::RepositoryError;

pub use kv::{CacheError, KvStore, MokaKvStore};
pub use store::{MemoryProductStore, ProductStore};

/// Fast-store key holding the serialized product list.
pub const ALL_PRODUCTS_KEY: &str = "products";

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this id in either store.
    #[error("product not found: {0}")]
    NotFound(String),

    /// The durable store returned no rows at all.
    #[error("no products found")]
    Empty,

    /// Input failed validation.
    #[error("invalid product: {0}")]
    Invalid(#[from] ProductError),

    /// A product with this id already exists.
    #[error("product already exists: {0}")]
    AlreadyExists(ProductId),

    /// Durable store failure.
    #[error(transparent)]
    Store(#[from] RepositoryError),

    /// Fast store failure during a mutation.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Product could not be serialized for the fast store.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A product as served to clients, with its absolute image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Read-through cache over the durable product store.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn KvStore>,
    image_base_url: String,
}

impl CatalogService {
    /// Create a catalog over `store`, cached in `cache`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ProductStore>,
        cache: Arc<dyn KvStore>,
        image_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            image_base_url: image_base_url.into(),
        }
    }

    /// The durable store behind this catalog.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` when the durable store has no rows and
    /// `CatalogError::Store` when it cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        if let Some(products) = self.cached::<Vec<Product>>(ALL_PRODUCTS_KEY).await {
            debug!(count = products.len(), "catalog list cache hit");
            return Ok(self.decorate_all(products));
        }

        let products = self.store.all().await?;
        if products.is_empty() {
            return Err(CatalogError::Empty);
        }

        self.populate(ALL_PRODUCTS_KEY, &products).await;
        Ok(self.decorate_all(products))
    }

    /// A single product by id fragment (`test1` or `@test1`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when neither store has the product
    /// (an empty fragment or bare `@` names no product) and
    /// `CatalogError::Store` when the durable store cannot be read.
    #[instrument(skip(self))]
    pub async fn get(&self, fragment: &str) -> Result<CatalogProduct, CatalogError> {
        let id = ProductId::normalize(fragment)
            .map_err(|_| CatalogError::NotFound(fragment.to_string()))?;

        if let Some(product) = self.cached::<Product>(id.as_str()).await {
            debug!(%id, "catalog item cache hit");
            return Ok(self.decorate(product));
        }

        let product = self
            .store
            .get(&id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        self.populate(id.as_str(), &product).await;
        Ok(self.decorate(product))
    }

    /// Add a new product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::AlreadyExists` for a duplicate id,
    /// `CatalogError::Invalid` for bad fields, and store or cache errors.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn create(&self, product: Product) -> Result<CatalogProduct, CatalogError> {
        product.validate()?;

        match self.store.insert(&product).await {
            Err(RepositoryError::Conflict(_)) => {
                return Err(CatalogError::AlreadyExists(product.id));
            }
            other => other?,
        }

        self.rewrite_item(&product).await?;
        self.invalidate_list().await?;
        Ok(self.decorate(product))
    }

    /// Replace an existing product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id does not exist,
    /// `CatalogError::Invalid` for bad fields, and store or cache errors.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn update(&self, product: Product) -> Result<CatalogProduct, CatalogError> {
        product.validate()?;

        if !self.store.update(&product).await? {
            return Err(CatalogError::NotFound(product.id.to_string()));
        }

        self.rewrite_item(&product).await?;
        self.invalidate_list().await?;
        Ok(self.decorate(product))
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id does not exist, and store
    /// or cache errors.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        if !self.store.delete(id).await? {
            return Err(CatalogError::NotFound(id.to_string()));
        }

        self.cache.delete(id.as_str()).await?;
        self.invalidate_list().await?;
        Ok(())
    }

    /// Drop every cached entry.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Cache` if the fast store fails.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<(), CatalogError> {
        self.cache.clear().await?;
        tracing::info!("catalog cache flushed");
        Ok(())
    }

    /// Absolute image URL for a stored relative path.
    #[must_use]
    pub fn image_url(&self, image: &str) -> String {
        format!("{}{image}", self.image_base_url)
    }

    fn decorate(&self, product: Product) -> CatalogProduct {
        CatalogProduct {
            image_url: self.image_url(&product.image),
            product,
        }
    }

    fn decorate_all(&self, products: Vec<Product>) -> Vec<CatalogProduct> {
        products.into_iter().map(|p| self.decorate(p)).collect()
    }

    /// Read and decode a cached value. Failures degrade to a miss.
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "catalog cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable catalog cache entry");
                None
            }
        }
    }

    /// Best-effort population after a durable read.
    async fn populate<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = match serde_json::to_string(value) {
            Ok(raw) => self.cache.put(key, raw).await.map_err(CatalogError::from),
            Err(e) => Err(CatalogError::from(e)),
        };
        if let Err(e) = result {
            warn!(key, error = %e, "catalog cache population failed");
        }
    }

    async fn rewrite_item(&self, product: &Product) -> Result<(), CatalogError> {
        let raw = serde_json::to_string(product)?;
        self.cache.put(product.id.as_str(), raw).await?;
        Ok(())
    }

    async fn invalidate_list(&self) -> Result<(), CatalogError> {
        self.cache.delete(ALL_PRODUCTS_KEY).await?;
        Ok(())
    }
}
