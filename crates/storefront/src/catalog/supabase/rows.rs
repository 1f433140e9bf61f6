//! Raw PostgREST rows and their conversion into domain products.
//!
//! Rows are decoded leniently: optional columns may be missing or `null`,
//! ids may be integers or strings, and option lists may be arrays or
//! comma-separated text.

use chrono::{DateTime, NaiveDateTime, Utc};
use pressmark_core::{Category, Product, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;

/// A row of the products table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: RawId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub colors: Option<StringList>,
    #[serde(default)]
    pub sizes: Option<StringList>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Primary key as stored: serial integers or text/uuid.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

/// Option list stored as a Postgres array or as comma-separated text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    Many(Vec<String>),
    One(String),
}

const fn default_active() -> bool {
    true
}

impl From<RawId> for ProductId {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Int(id) => Self::from(id),
            RawId::Text(id) => Self::new(id),
        }
    }
}

impl StringList {
    fn into_values(self) -> Vec<String> {
        let values = match self {
            Self::Many(values) => values,
            Self::One(joined) => joined.split(',').map(str::to_string).collect(),
        };
        values
            .into_iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}

/// Convert a row into a [`Product`].
pub fn convert_product(row: ProductRow) -> Product {
    Product {
        id: row.id.into(),
        name: row.name,
        description: row.description.filter(|d| !d.trim().is_empty()),
        price: row.price,
        image_url: row.image_url.filter(|url| !url.trim().is_empty()),
        category: row
            .category
            .as_deref()
            .map_or_else(|| Category::Uncategorized(String::new()), Category::parse),
        is_active: row.is_active,
        is_featured: row.is_featured,
        stock: row
            .stock
            .map(|stock| u32::try_from(stock.max(0)).unwrap_or(u32::MAX)),
        colors: row.colors.map(StringList::into_values).unwrap_or_default(),
        sizes: row.sizes.map(StringList::into_values).unwrap_or_default(),
        created_at: row.created_at.as_deref().and_then(parse_timestamp),
    }
}

/// Parse `timestamptz` (RFC 3339) or zone-less `timestamp` values.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Datelike;
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Product {
        convert_product(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_full_row() {
        let product = decode(json!({
            "id": 12,
            "name": "Letterpress Notebook",
            "description": "A5, dotted",
            "price": 18.5,
            "image_url": "https://cdn.pressmark.dev/notebook.jpg",
            "category": "Stationery",
            "is_active": true,
            "is_featured": true,
            "stock": 4,
            "colors": ["navy", "cream"],
            "sizes": ["A5"],
            "created_at": "2026-03-01T12:00:00+00:00"
        }));

        assert_eq!(product.id.as_str(), "12");
        assert_eq!(product.price, Decimal::new(185, 1));
        assert_eq!(product.category, Category::Stationery);
        assert_eq!(product.stock, Some(4));
        assert_eq!(product.colors, ["navy", "cream"]);
        assert_eq!(product.created_at.unwrap().month(), 3);
    }

    #[test]
    fn test_minimal_row() {
        let product = decode(json!({
            "id": "b7e1",
            "name": "Sticker Pack",
            "price": "4.00"
        }));

        assert!(product.is_active);
        assert!(!product.is_featured);
        assert_eq!(product.stock, None);
        assert!(product.colors.is_empty());
        assert_eq!(product.category, Category::Uncategorized(String::new()));
        assert_eq!(product.created_at, None);
    }

    #[test]
    fn test_nulls_and_lenient_values() {
        let product = decode(json!({
            "id": 3,
            "name": "Tote",
            "price": 25,
            "image": "",
            "description": null,
            "category": "zines",
            "stock": -2,
            "sizes": "S, M ,,L",
            "colors": null,
            "created_at": "2026-01-05 09:30:00"
        }));

        assert_eq!(product.image_url, None);
        assert_eq!(product.description, None);
        assert_eq!(product.category, Category::Uncategorized("zines".to_string()));
        assert_eq!(product.stock, Some(0));
        assert_eq!(product.sizes, ["S", "M", "L"]);
        assert!(product.colors.is_empty());
        assert_eq!(product.created_at.unwrap().day(), 5);
    }

    #[test]
    fn test_row_missing_price_is_rejected() {
        let result: Result<ProductRow, _> = serde_json::from_value(json!({"id": 1, "name": "x"}));
        assert!(result.is_err());
    }
}
