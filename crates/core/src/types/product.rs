//! Catalog product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::id::ProductId;

/// A product as published by the backend.
///
/// Products are read-only on the storefront; they are fetched, filtered and
/// rendered but never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in the store currency.
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: Category,
    pub is_active: bool,
    pub is_featured: bool,
    /// Units available, when the backend tracks stock for this product.
    pub stock: Option<u32>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Create an active product with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            image_url: None,
            category: Category::Uncategorized(String::new()),
            is_active: true,
            is_featured: false,
            stock: None,
            colors: Vec::new(),
            sizes: Vec::new(),
            created_at: None,
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the known stock level.
    #[must_use]
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Whether the product is known to be sold out.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.stock == Some(0)
    }
}
