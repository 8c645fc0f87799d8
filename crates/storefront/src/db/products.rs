//! Product repository over `catalog.product`.
//!
//! Uses runtime-checked queries so the crate builds without a live database.

use async_trait::async_trait;
use sqlx::PgPool;

use contraentrega_core::{Price, Product, ProductId};

use super::RepositoryError;
use crate::catalog::ProductStore;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price: i64,
    stock: i32,
    image: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = ProductId::normalize(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid product id in database: {e}"))
        })?;
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for {id}: {e}"))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative stock for {id}: {}", row.stock))
        })?;

        Ok(Self {
            id,
            name: row.name,
            price,
            stock,
            image: row.image,
        })
    }
}

fn stock_column(product: &Product) -> Result<i32, RepositoryError> {
    i32::try_from(product.stock).map_err(|_| {
        RepositoryError::Conflict(format!("stock for {} exceeds column range", product.id))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed product store.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product or overwrite the existing row with the same id.
    ///
    /// Used by seeding; bypasses the catalog cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.product (id, name, price, stock, image)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = $2, price = $3, stock = $4, image = $5, updated_at = NOW()
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(stock_column(product)?)
        .bind(&product.image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, stock, image
            FROM catalog.product
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, stock, image
            FROM catalog.product
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO catalog.product (id, name, price, stock, image)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(stock_column(product)?)
        .bind(&product.image)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, product: &Product) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalog.product
            SET name = $2, price = $3, stock = $4, image = $5, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(stock_column(product)?)
        .bind(&product.image)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(price: i64, stock: i32) -> ProductRow {
        ProductRow {
            id: "@cafe".to_string(),
            name: "Café".to_string(),
            price,
            stock,
            image: "cafe.jpg".to_string(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let product = Product::try_from(row(15_000, 4)).unwrap();
        assert_eq!(product.id.as_str(), "@cafe");
        assert_eq!(product.price.amount(), 15_000);
        assert_eq!(product.stock, 4);
    }

    #[test]
    fn test_row_negative_price_is_corruption() {
        assert!(matches!(
            Product::try_from(row(-1, 4)),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_row_negative_stock_is_corruption() {
        assert!(matches!(
            Product::try_from(row(1, -4)),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
