//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{Price, ProductId, ValidationErrors, require_text};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category: String,
    /// Reference to an uploaded image (path or URL). Upload storage is
    /// handled outside this service.
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated product ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category: String,
    pub image: String,
}

/// Product fields as submitted by a client.
///
/// `price` accepts either a JSON number or a decimal string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub image: Option<String>,
}

const MIN_NAME_CHARS: usize = 2;
const MIN_DESCRIPTION_CHARS: usize = 10;
const MIN_CATEGORY_CHARS: usize = 2;

impl ProductInput {
    /// Check every field and build a [`NewProduct`].
    ///
    /// # Errors
    ///
    /// Returns every failed field check at once.
    pub fn validate(&self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = require_text(&mut errors, "name", self.name.as_deref(), MIN_NAME_CHARS);
        let description = require_text(
            &mut errors,
            "description",
            self.description.as_deref(),
            MIN_DESCRIPTION_CHARS,
        );
        let category = require_text(
            &mut errors,
            "category",
            self.category.as_deref(),
            MIN_CATEGORY_CHARS,
        );
        let image = require_text(&mut errors, "image", self.image.as_deref(), 1);

        let price = match self.price {
            None => {
                errors.add("price", "price is required");
                None
            }
            Some(amount) => Price::new(amount)
                .map_err(|e| errors.add("price", e.to_string()))
                .ok(),
        };

        let stock = match self.stock {
            None => {
                errors.add("stock", "stock is required");
                None
            }
            Some(n) if n < 0 => {
                errors.add("stock", "stock cannot be negative");
                None
            }
            Some(n) => i32::try_from(n)
                .map_err(|_| errors.add("stock", "stock is too large"))
                .ok(),
        };

        match (name, description, price, stock, category, image) {
            (Some(name), Some(description), Some(price), Some(stock), Some(category), Some(image)) => {
                Ok(NewProduct {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    image,
                })
            }
            _ => Err(errors),
        }
    }
}
