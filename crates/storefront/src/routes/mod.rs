//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured carousel, latest products)
//! GET  /featured?start=N       - Featured carousel fragment
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (catalog configured)
//!
//! # Products
//! GET  /products               - Product listing (category, q, sort, per_page, page)
//! GET  /products/{id}          - Product detail (color, size, text, qty)
//!
//! # Cart
//! GET  /cart                   - Cart page (revalidates lines)
//! POST /cart/add               - Add to cart, redirects to `return_to`
//! POST /cart/update            - Set line quantity
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /api/cart               - Cart as JSON
//! ```

pub mod cart;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::catalog::CatalogError;
use crate::error::Result;
use crate::models::Notice;
use crate::models::notice::take_flashes;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/featured", get(home::featured))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/api/cart", get(cart::json))
}

// =============================================================================
// Page Layout
// =============================================================================

/// Data every full page needs: the cart badge and pending notices.
#[derive(Clone, Default)]
pub struct LayoutView {
    pub cart_count: u64,
    pub notices: Vec<Notice>,
}

impl LayoutView {
    /// Blocking notices, shown as a banner above the page.
    #[must_use]
    pub fn banners(&self) -> Vec<&Notice> {
        self.notices.iter().filter(|n| n.blocking).collect()
    }

    /// Dismissible notices.
    #[must_use]
    pub fn toasts(&self) -> Vec<&Notice> {
        self.notices.iter().filter(|n| !n.blocking).collect()
    }

    /// Add a notice unless an identical one is already queued.
    pub fn push(&mut self, notice: Notice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }

    /// Surface a failed catalog read.
    pub fn catalog_error(&mut self, err: &CatalogError) {
        self.push(Notice::from_catalog_error(err));
    }
}

/// Build the layout for the current visitor, consuming queued flashes.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn page_layout(session: &Session) -> Result<LayoutView> {
    let cart = cart::open_cart(session).await?;
    let cart_count = cart.total_items();
    cart::save_cart(session, cart).await?;

    Ok(LayoutView {
        cart_count,
        notices: take_flashes(session).await?,
    })
}

/// Local path to redirect to, or `fallback` when `candidate` is missing or
/// points off-site.
#[must_use]
pub fn safe_return_path(candidate: Option<&str>, fallback: &str) -> String {
    candidate
        .map(str::trim)
        .filter(|path| {
            path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
        })
        .map_or_else(|| fallback.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/products/4?qty=2"), "/cart"), "/products/4?qty=2");
        assert_eq!(safe_return_path(None, "/cart"), "/cart");
        assert_eq!(safe_return_path(Some(""), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("https://evil.test/"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("//evil.test/"), "/cart"), "/cart");
        assert_eq!(safe_return_path(Some("/\\evil.test"), "/cart"), "/cart");
    }

    #[test]
    fn test_layout_deduplicates_notices() {
        let mut layout = LayoutView::default();
        layout.catalog_error(&CatalogError::NotConfigured);
        layout.catalog_error(&CatalogError::NotConfigured);
        layout.push(Notice::success("Added"));

        assert_eq!(layout.notices.len(), 2);
        assert_eq!(layout.banners().len(), 1);
        assert_eq!(layout.toasts().len(), 1);
    }
}
