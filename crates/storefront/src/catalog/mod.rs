//! Product catalog backed by Supabase.
//!
//! # Architecture
//!
//! - The catalog lives in a Supabase `products` table, read through PostgREST
//! - The storefront never writes products; every read is a plain `GET`
//! - Listings and detail lookups are cached via `moka` (configurable TTL)
//! - Cart revalidation uses [`ProductCatalog::lookup_product`], which bypasses
//!   the cache so removed products are noticed promptly
//!
//! # Failure classes
//!
//! Every [`CatalogError`] is either a configuration problem (missing or
//! rejected credentials) or a network problem (timeouts, 5xx, bad payloads).
//! Pages show configuration problems as a blocking banner and network
//! problems as a dismissible notice; in both cases the affected section
//! renders as empty.
//!
//! # Example
//!
//! ```rust,ignore
//! use pressmark_storefront::catalog::{ProductQuery, SupabaseClient};
//!
//! let client = SupabaseClient::new(config.supabase.as_ref(), &config.catalog)?;
//!
//! let featured = client.list_products(ProductQuery::active().featured().limit(12)).await?;
//! let product = client.get_product(&"42".into()).await?;
//! ```

mod supabase;

use std::future::Future;

use pressmark_core::{Product, ProductId};
use thiserror::Error;

pub use supabase::{ProductQuery, ProductRow, SupabaseClient};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No Supabase URL/key configured.
    #[error("catalog backend is not configured")]
    NotConfigured,

    /// The backend rejected the API key.
    #[error("catalog backend rejected the API key (HTTP {0})")]
    Unauthorized(u16),

    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("catalog backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The configured table produced an unusable URL.
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// How a catalog failure is surfaced to visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The store itself is misconfigured; nothing will load until an
    /// operator fixes it.
    Configuration,
    /// A transient failure; retrying may help.
    Network,
}

impl CatalogError {
    /// Classify the error for display.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotConfigured | Self::Unauthorized(_) | Self::InvalidUrl(_) => {
                ErrorClass::Configuration
            }
            Self::Http(_) | Self::Parse(_) | Self::RateLimited(_) | Self::Api { .. } => {
                ErrorClass::Network
            }
        }
    }

    /// Message safe to show to visitors.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::NotConfigured | Self::Unauthorized(_) | Self::InvalidUrl(_) => {
                "The product catalog is not configured yet. Products will appear once the store is set up."
            }
            Self::RateLimited(_) => "The store is busy right now. Please try again in a moment.",
            Self::Http(_) | Self::Parse(_) | Self::Api { .. } => {
                "We couldn't reach the product catalog. Please check your connection and try again."
            }
        }
    }
}

/// Source of truth for product availability.
///
/// Implemented by [`SupabaseClient`]; tests substitute in-memory catalogs.
pub trait ProductCatalog: Clone + Send + Sync + 'static {
    /// Fetch a product by id regardless of its active flag, bypassing any
    /// cache. `Ok(None)` means the backend has no such product.
    fn lookup_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, CatalogError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(CatalogError::NotConfigured.class(), ErrorClass::Configuration);
        assert_eq!(CatalogError::Unauthorized(401).class(), ErrorClass::Configuration);
        assert_eq!(CatalogError::RateLimited(3).class(), ErrorClass::Network);
        assert_eq!(
            CatalogError::Api {
                status: 503,
                message: "unavailable".to_string()
            }
            .class(),
            ErrorClass::Network
        );
    }

    #[test]
    fn test_error_display() {
        let err = CatalogError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "catalog backend returned HTTP 500: boom");
        assert_eq!(
            CatalogError::RateLimited(7).to_string(),
            "Rate limited, retry after 7 seconds"
        );
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = CatalogError::Api {
            status: 500,
            message: "relation \"products\" does not exist".to_string(),
        };
        assert!(!err.user_message().contains("relation"));
        assert!(CatalogError::NotConfigured.user_message().contains("not configured"));
    }
}
