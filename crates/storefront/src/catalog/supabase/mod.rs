//! Supabase PostgREST client implementation.
//!
//! Reads the products table with `reqwest`; caches listings and product
//! details using `moka` (TTL from `CATALOG_CACHE_TTL_SECS`).

mod cache;
mod query;
mod rows;

use std::sync::Arc;

use moka::future::Cache;
use pressmark_core::{Category, CategoryFilter, Product, ProductId};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{CatalogSettings, SupabaseConfig};

use super::{CatalogError, ProductCatalog};
use cache::{CacheKey, CacheValue};
pub use query::ProductQuery;
pub use rows::ProductRow;
use rows::convert_product;

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for the Supabase products table.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
/// A client built without a [`SupabaseConfig`] answers every read with
/// [`CatalogError::NotConfigured`].
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    /// `{url}/rest/v1/{table}`, absent when the backend is not configured
    table_url: Option<Url>,
    cache: Cache<CacheKey, CacheValue>,
    listing_limit: usize,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the table URL cannot be built or the API key is
    /// not a valid header value.
    pub fn new(
        config: Option<&SupabaseConfig>,
        settings: &CatalogSettings,
    ) -> Result<Self, CatalogError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(settings.cache_ttl)
            .build();

        let (client, table_url) = match config {
            Some(config) => {
                let table_url = config
                    .url
                    .join(&format!("rest/v1/{}", config.products_table))?;
                let client = reqwest::Client::builder()
                    .default_headers(auth_headers(config)?)
                    .timeout(config.timeout)
                    .build()?;
                (client, Some(table_url))
            }
            None => (reqwest::Client::new(), None),
        };

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                table_url,
                cache,
                listing_limit: settings.listing_limit,
            }),
        })
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.table_url.is_some()
    }

    /// Maximum rows fetched for the full product listing.
    #[must_use]
    pub fn listing_limit(&self) -> usize {
        self.inner.listing_limit
    }

    /// Run a query against the products table.
    async fn execute(&self, query: &ProductQuery) -> Result<Vec<Product>, CatalogError> {
        let table_url = self
            .inner
            .table_url
            .as_ref()
            .ok_or(CatalogError::NotConfigured)?;

        let mut url = table_url.clone();
        url.query_pairs_mut().extend_pairs(query.to_params());

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::error!(status = %status, "Supabase rejected the API key");
            return Err(CatalogError::Unauthorized(status.as_u16()));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Supabase returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        let rows: Vec<ProductRow> = match serde_json::from_str(&response_text) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Supabase response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        Ok(rows.into_iter().map(convert_product).collect())
    }

    // =========================================================================
    // Listing Methods
    // =========================================================================

    /// Run a listing query.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>, CatalogError> {
        let cache_key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = self.execute(&query).await?;
        debug!(count = products.len(), "Fetched products");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// All active products, newest first, up to the listing limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the request fails.
    pub async fn all_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.list_products(ProductQuery::active().limit(self.inner.listing_limit))
            .await
    }

    /// Active featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the request fails.
    pub async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        self.list_products(ProductQuery::active().featured().limit(limit))
            .await
    }

    /// The most recently added active products.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the request fails.
    pub async fn latest_products(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        self.list_products(ProductQuery::active().limit(limit)).await
    }

    /// Active products sharing `product`'s category, excluding `product`.
    ///
    /// Picked from the cached listing, so related products see the same
    /// category mapping as the listing filter. Products without a category
    /// have no related products.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the request fails.
    pub async fn related_products(
        &self,
        product: &Product,
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        if matches!(&product.category, Category::Uncategorized(raw) if raw.is_empty()) {
            return Ok(Vec::new());
        }
        let same_category = CategoryFilter::Only(product.category.clone());

        Ok(self
            .all_products()
            .await?
            .into_iter()
            .filter(|candidate| candidate.id != product.id)
            .filter(|candidate| same_category.matches(&candidate.category))
            .take(limit)
            .collect())
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by id (cached). Inactive products are returned as-is;
    /// callers decide how to present them.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not configured or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = self.fetch_product(id).await?;

        // Misses are not cached so newly published products show up at once
        if let Some(product) = &product {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }

    /// Single-row lookup without the cache.
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let mut products = self.execute(&ProductQuery::by_id(id)).await?;
        Ok(products.pop())
    }

    /// Drop every cached listing and product.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }
}

impl ProductCatalog for SupabaseClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn lookup_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        self.fetch_product(id).await
    }
}

/// `apikey` and bearer headers sent with every request.
fn auth_headers(config: &SupabaseConfig) -> Result<HeaderMap, CatalogError> {
    let key = config.anon_key.expose_secret();
    let invalid = |_| CatalogError::Unauthorized(0);

    let mut api_key = HeaderValue::from_str(key).map_err(invalid)?;
    api_key.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", api_key);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    fn unconfigured() -> SupabaseClient {
        SupabaseClient::new(None, &CatalogSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_not_configured() {
        let client = unconfigured();
        assert!(!client.is_configured());

        let err = client.all_products().await.unwrap_err();
        assert!(matches!(err, CatalogError::NotConfigured));

        let err = client.lookup_product(&ProductId::new("1")).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotConfigured));
    }

    #[tokio::test]
    async fn test_related_products_without_category() {
        let client = unconfigured();
        let product = Product::new("1", "Plain", rust_decimal::Decimal::ONE);
        // Short-circuits before touching the (missing) backend
        assert!(client.related_products(&product, 4).await.unwrap().is_empty());
    }

    #[test]
    fn test_table_url() {
        let config = SupabaseConfig {
            url: Url::parse("https://abcd.supabase.co").unwrap(),
            anon_key: SecretString::from("eyJhbGciOiJIUzI1NiJ9.aB3xY9mK2nL5pQ7rT0uW4zC6"),
            products_table: "products".to_string(),
            timeout: Duration::from_secs(5),
        };
        let client = SupabaseClient::new(Some(&config), &CatalogSettings::default()).unwrap();

        assert!(client.is_configured());
        assert_eq!(
            client.inner.table_url.as_ref().unwrap().as_str(),
            "https://abcd.supabase.co/rest/v1/products"
        );
    }

    #[test]
    fn test_auth_headers_rejects_control_characters() {
        let config = SupabaseConfig {
            url: Url::parse("https://abcd.supabase.co").unwrap(),
            anon_key: SecretString::from("bad\nkey"),
            products_table: "products".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(matches!(
            auth_headers(&config),
            Err(CatalogError::Unauthorized(0))
        ));
    }
}
