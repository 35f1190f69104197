//! Seed the catalog from a YAML file.
//!
//! The file is a list of products in the same shape the API accepts:
//!
//! ```yaml
//! - name: Enamel Mug
//!   description: Twelve ounce camp mug with a steel rim
//!   price: "14.50"
//!   stock: 40
//!   category: Kitchen
//!   image: /uploads/mug.png
//! ```
//!
//! Every entry is validated before anything is written.

use std::path::Path;

use tracing::{error, info};

use emporium_api::db::CatalogStore;
use emporium_api::models::{NewProduct, ProductInput};

use super::connect;

/// Parse and validate a catalog file.
///
/// Errors name the entry by position and by field.
fn parse_catalog(content: &str) -> Result<Vec<NewProduct>, Box<dyn std::error::Error>> {
    let inputs: Vec<ProductInput> = serde_yaml::from_str(content)?;

    let mut products = Vec::with_capacity(inputs.len());
    let mut failures = 0usize;
    for (index, input) in inputs.iter().enumerate() {
        match input.validate() {
            Ok(product) => products.push(product),
            Err(errors) => {
                failures += 1;
                error!("  - entry {}: {errors}", index + 1);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} invalid products found").into());
    }
    Ok(products)
}

/// Insert products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry fails
/// validation, or database operations fail.
pub async fn products(
    file_path: &Path,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path).await?;
    let products = parse_catalog(&content)?;
    info!(products = products.len(), "Catalog validated");

    let store = connect().await?;

    if clear_existing {
        let existing = store.list_products().await?;
        for product in &existing {
            store.delete_product(product.id).await?;
        }
        info!(deleted = existing.len(), "Cleared existing products");
    }

    for product in &products {
        let created = store.create_product(product).await?;
        info!(product_id = %created.id, name = %created.name, "Inserted product");
    }

    info!("Seeding complete! {} products inserted", products.len());
    Ok(())
}
