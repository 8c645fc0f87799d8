//! Fast key-value store sitting in front of the durable catalog.

use async_trait::async_trait;
use moka::future::Cache;
use thiserror::Error;

/// Errors from the fast store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The fast store rejected or could not complete the operation.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Minimal key-value contract the catalog needs.
///
/// Values are serialized JSON. Entries never expire; they only leave the
/// store through `delete`, `clear`, or capacity eviction.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a value with no expiry.
    async fn put(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every value.
    async fn clear(&self) -> Result<(), CacheError>;
}

/// In-process fast store backed by `moka`.
#[derive(Clone)]
pub struct MokaKvStore {
    cache: Cache<String, String>,
}

impl MokaKvStore {
    /// Create a store holding at most `max_capacity` entries, without TTL.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }
}

impl std::fmt::Debug for MokaKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaKvStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl KvStore for MokaKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache.get(key).await)
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.cache.insert(key.to_owned(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.cache.invalidate_all();
        Ok(())
    }
}
