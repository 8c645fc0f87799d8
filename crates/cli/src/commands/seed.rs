//! Seed the durable catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - id: "@cafe"
//!   name: Café de Huila 500g
//!   price: 32000
//!   stock: 12
//!   image: cafe.jpg
//! ```
//!
//! Ids are normalized, so `cafe` and `@cafe` name the same product. Existing
//! rows are overwritten. Seeding writes straight to `PostgreSQL`; a running
//! storefront keeps serving cached entries until `/admin/cache/flush`.

use std::collections::HashSet;
use std::path::Path;

use tracing::{error, info};

use contraentrega_core::Product;
use contraentrega_storefront::db::{self, PgProductStore};

use super::database_url;

/// Parse and validate a seed file.
///
/// Returns every problem found rather than stopping at the first.
///
/// # Errors
///
/// Returns the YAML error if the file does not parse, or the list of
/// validation messages.
pub fn parse(content: &str) -> Result<Vec<Product>, Vec<String>> {
    let products: Vec<Product> = serde_yaml::from_str(content).map_err(|e| vec![e.to_string()])?;

    let mut seen = HashSet::new();
    let mut errors = Vec::new();
    for product in &products {
        if let Err(e) = product.validate() {
            errors.push(format!("{}: {e}", product.id));
        }
        if !seen.insert(product.id.as_str()) {
            errors.push(format!("{}: duplicate id", product.id));
        }
    }

    if errors.is_empty() {
        Ok(products)
    } else {
        Err(errors)
    }
}

/// Upsert products from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML file
/// * `dry_run` - Validate only; do not connect to the database
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or a database
/// operation fails.
pub async fn products(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;

    let products = match parse(&content) {
        Ok(products) => products,
        Err(errors) => {
            error!("Seed file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    info!(products = products.len(), "Seed file validated");
    if dry_run {
        return Ok(());
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let store = PgProductStore::new(pool);
    for product in &products {
        store.upsert(product).await?;
        info!(id = %product.id, stock = product.stock, "Product upserted");
    }

    info!(
        products = products.len(),
        "Seeding complete. Flush the storefront cache to serve the new catalog."
    );
    Ok(())
}
