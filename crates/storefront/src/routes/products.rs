//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pressmark_core::listing::{DEFAULT_PAGE_SIZE, ListingState, PAGE_SIZES, SortKey};
use pressmark_core::pagination::PageLink;
use pressmark_core::selection::ProductSelection;
use pressmark_core::{Category, CategoryFilter, CurrencyCode, Price, Product, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use crate::catalog::{CatalogError, ErrorClass};
use crate::error::Result;
use crate::filters;
use crate::routes::{LayoutView, page_layout};
use crate::state::AppState;

/// Related products shown under a product.
const RELATED_LIMIT: usize = 4;

/// Paper types offered for print jobs.
pub const PAPER_TYPES: [&str; 4] = ["standard", "matte", "glossy", "cardstock"];

/// Sheet sizes offered for print jobs.
pub const PRINT_SIZES: [&str; 4] = ["A4", "A5", "A3", "Letter"];

// =============================================================================
// View Types
// =============================================================================

/// Product card display data for templates.
///
/// The card links to `href` and its quick-add form sends the visitor back to
/// `return_to`; both are chosen by the page rendering the card.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub href: String,
    pub return_to: String,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category_label: String,
    pub badge_class: &'static str,
    pub sold_out: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode, return_to: &str) -> Self {
        Self {
            id: product.id.to_string(),
            href: product_href(&product.id),
            return_to: return_to.to_string(),
            name: product.name.clone(),
            price: format_price(product, currency),
            image_url: product.image_url.clone(),
            category_label: product.category.label().to_string(),
            badge_class: product.category.badge_class(),
            sold_out: product.is_sold_out(),
        }
    }
}

/// A `<select>` option.
#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Page-number strip entry.
#[derive(Clone)]
pub struct PageLinkView {
    pub label: String,
    /// `None` for the ellipsis and the current page.
    pub href: Option<String>,
    pub current: bool,
}

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub category_label: String,
    pub badge_class: &'static str,
    pub stock_label: Option<String>,
    pub sold_out: bool,
    pub colors: Vec<OptionView>,
    pub sizes: Vec<OptionView>,
    pub custom_text: String,
    pub quantity: u32,
    pub max_quantity: Option<u32>,
    pub decrement_href: Option<String>,
    pub increment_href: Option<String>,
    pub is_print: bool,
    pub paper_types: Vec<&'static str>,
    pub print_sizes: Vec<&'static str>,
}

impl ProductDetailView {
    fn new(product: &Product, selection: &ProductSelection, currency: CurrencyCode) -> Self {
        let options = |values: &[String], selected: Option<&str>| -> Vec<OptionView> {
            values
                .iter()
                .map(|value| OptionView {
                    value: value.clone(),
                    label: value.clone(),
                    selected: selected == Some(value.as_str()),
                })
                .collect()
        };

        let quantity = selection.quantity();
        let quantity_href = |qty: u32| {
            let mut query = form_urlencoded::Serializer::new(String::new());
            if let Some(color) = selection.color() {
                query.append_pair("color", color);
            }
            if let Some(size) = selection.size() {
                query.append_pair("size", size);
            }
            if let Some(text) = selection.custom_text() {
                query.append_pair("text", text);
            }
            query.append_pair("qty", &qty.to_string());
            format!("{}?{}", product_href(&product.id), query.finish())
        };

        Self {
            id: product.id.to_string(),
            href: product_href(&product.id),
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_price(product, currency),
            image_url: product.image_url.clone(),
            category_label: product.category.label().to_string(),
            badge_class: product.category.badge_class(),
            stock_label: stock_label(product.stock),
            sold_out: product.is_sold_out(),
            colors: options(&product.colors, selection.color()),
            sizes: options(&product.sizes, selection.size()),
            custom_text: selection.custom_text().unwrap_or_default().to_string(),
            quantity,
            max_quantity: selection.stock().map(|stock| stock.max(1)),
            decrement_href: (quantity > 1).then(|| quantity_href(quantity - 1)),
            increment_href: selection
                .can_increment()
                .then(|| quantity_href(quantity.saturating_add(1))),
            is_print: product.category == Category::Prints,
            paper_types: PAPER_TYPES.to_vec(),
            print_sizes: PRINT_SIZES.to_vec(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Path of a product's detail page.
#[must_use]
pub fn product_href(id: &ProductId) -> String {
    let encoded: String = id
        .as_str()
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                char::from(b).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();
    format!("/products/{encoded}")
}

/// Format a product's price in the store currency.
#[must_use]
pub fn format_price(product: &Product, currency: CurrencyCode) -> String {
    Price::new(product.price, currency).display()
}

fn stock_label(stock: Option<u32>) -> Option<String> {
    match stock {
        None => None,
        Some(0) => Some("Sold out".to_string()),
        Some(n) if n <= 5 => Some(format!("Only {n} left")),
        Some(_) => Some("In stock".to_string()),
    }
}

/// Listing URL for `listing` at `page`, omitting defaults.
fn listing_href(listing: &ListingState, page: usize) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if listing.category() != &CategoryFilter::All {
        query.append_pair("category", listing.category().slug());
    }
    if !listing.search().is_empty() {
        query.append_pair("q", listing.search());
    }
    if listing.sort() != SortKey::default() {
        query.append_pair("sort", listing.sort().as_str());
    }
    if listing.page_size() != DEFAULT_PAGE_SIZE {
        query.append_pair("per_page", &listing.page_size().to_string());
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }

    let query = query.finish();
    if query.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{query}")
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|value| value.trim().parse().ok())
}

// =============================================================================
// Listing
// =============================================================================

/// Listing query parameters.
///
/// Numbers are taken as strings so malformed values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
}

impl ListingQuery {
    /// Listing state described by the URL.
    #[must_use]
    pub fn to_state(&self) -> ListingState {
        ListingState::restore(
            CategoryFilter::parse(self.category.as_deref().unwrap_or_default()),
            self.q.as_deref().unwrap_or_default(),
            SortKey::parse_or_default(self.sort.as_deref().unwrap_or_default()),
            parse_number(self.per_page.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE),
            parse_number(self.page.as_deref()).unwrap_or(1),
        )
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: LayoutView,
    pub products: Vec<ProductCardView>,
    pub search: String,
    pub category_options: Vec<OptionView>,
    pub sort_options: Vec<OptionView>,
    pub page_size_options: Vec<OptionView>,
    pub page_links: Vec<PageLinkView>,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub total_matches: usize,
    pub page: usize,
    pub total_pages: usize,
    pub is_filtered: bool,
}

/// Display product listing page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let mut layout = page_layout(&session).await?;
    let listing = query.to_state();

    let products = match state.catalog().all_products().await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch product listing");
            layout.catalog_error(&e);
            Vec::new()
        }
    };

    let page = listing.apply(&products);
    let currency = state.currency();
    let return_to = listing_href(&listing, page.page);

    let category_options = std::iter::once(OptionView {
        value: CategoryFilter::ALL.to_string(),
        label: "All categories".to_string(),
        selected: listing.category() == &CategoryFilter::All,
    })
    .chain(Category::KNOWN.iter().map(|category| OptionView {
        value: category.slug().to_string(),
        label: category.label().to_string(),
        selected: listing.category() == &CategoryFilter::Only(category.clone()),
    }))
    .collect();

    let sort_options = SortKey::ALL
        .iter()
        .map(|sort| OptionView {
            value: sort.as_str().to_string(),
            label: sort.label().to_string(),
            selected: *sort == listing.sort(),
        })
        .collect();

    let page_size_options = PAGE_SIZES
        .iter()
        .map(|size| OptionView {
            value: size.to_string(),
            label: format!("{size} per page"),
            selected: *size == listing.page_size(),
        })
        .collect();

    let page_links = page
        .links
        .iter()
        .map(|link| match *link {
            PageLink::Page(number) => PageLinkView {
                label: number.to_string(),
                href: (number != page.page).then(|| listing_href(&listing, number)),
                current: number == page.page,
            },
            PageLink::Ellipsis => PageLinkView {
                label: "\u{2026}".to_string(),
                href: None,
                current: false,
            },
        })
        .collect();

    Ok(ProductsIndexTemplate {
        layout,
        products: page
            .items
            .iter()
            .map(|product| ProductCardView::new(product, currency, &return_to))
            .collect(),
        search: listing.search().to_string(),
        category_options,
        sort_options,
        page_size_options,
        page_links,
        previous_href: page
            .has_previous()
            .then(|| listing_href(&listing, page.page - 1)),
        next_href: page
            .has_next()
            .then(|| listing_href(&listing, page.page + 1)),
        total_matches: page.total_matches,
        page: page.page,
        total_pages: page.total_pages,
        is_filtered: listing.category() != &CategoryFilter::All || !listing.search().is_empty(),
    })
}

// =============================================================================
// Detail
// =============================================================================

/// Selection query parameters on the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub color: Option<String>,
    pub size: Option<String>,
    pub text: Option<String>,
    pub qty: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: LayoutView,
    pub product: ProductDetailView,
    pub related: Vec<ProductCardView>,
}

/// Product not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub layout: LayoutView,
    pub headline: String,
}

/// Apply URL selection parameters to a fresh selection.
fn selection_from_query(product: &Product, query: &SelectionQuery) -> ProductSelection {
    let mut selection = ProductSelection::for_product(product);
    if let Some(color) = query.color.as_deref()
        && product.colors.iter().any(|c| c == color)
    {
        selection.set_color(color);
    }
    if let Some(size) = query.size.as_deref()
        && product.sizes.iter().any(|s| s == size)
    {
        selection.set_size(size);
    }
    if let Some(text) = query.text.as_deref() {
        selection.set_custom_text(text);
    }
    if let Some(qty) = parse_number::<i64>(query.qty.as_deref()) {
        selection.set_quantity(qty);
    }
    selection
}

fn not_found(layout: LayoutView, status: StatusCode, headline: &str) -> Response {
    (
        status,
        ProductNotFoundTemplate {
            layout,
            headline: headline.to_string(),
        },
    )
        .into_response()
}

/// Display product detail page.
#[instrument(skip(state, session, query), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<Response> {
    let mut layout = page_layout(&session).await?;

    let Some(product_id) = ProductId::parse(&id) else {
        return Ok(not_found(layout, StatusCode::NOT_FOUND, "Product not found"));
    };

    let product = match state.catalog().get_product(&product_id).await {
        Ok(Some(product)) if product.is_active => product,
        Ok(_) => {
            return Ok(not_found(layout, StatusCode::NOT_FOUND, "Product not found"));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch product");
            layout.catalog_error(&e);
            return Ok(not_found(
                layout,
                catalog_failure_status(&e),
                "This product can't be shown right now",
            ));
        }
    };

    let related = match state.catalog().related_products(&product, RELATED_LIMIT).await {
        Ok(related) => related,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch related products");
            Vec::new()
        }
    };

    let currency = state.currency();
    let selection = selection_from_query(&product, &query);
    let return_to = product_href(&product.id);

    Ok(ProductShowTemplate {
        layout,
        product: ProductDetailView::new(&product, &selection, currency),
        related: related
            .iter()
            .map(|item| ProductCardView::new(item, currency, &return_to))
            .collect(),
    }
    .into_response())
}

const fn catalog_failure_status(err: &CatalogError) -> StatusCode {
    match err.class() {
        ErrorClass::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        ErrorClass::Network => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let mut query = ListingQuery::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "category" => query.category = value,
                "q" => query.q = value,
                "sort" => query.sort = value,
                "per_page" => query.per_page = value,
                "page" => query.page = value,
                _ => {}
            }
        }
        query
    }

    #[test]
    fn test_listing_query_defaults() {
        let state = ListingQuery::default().to_state();
        assert_eq!(state.category(), &CategoryFilter::All);
        assert_eq!(state.sort(), SortKey::Newest);
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(state.page(), 1);
        assert_eq!(listing_href(&state, 1), "/products");
    }

    #[test]
    fn test_listing_query_malformed_numbers_fall_back() {
        let state = query(&[("per_page", "lots"), ("page", "-3")]).to_state();
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_listing_href_round_trips_state() {
        let state = query(&[
            ("category", "prints"),
            ("q", "tote bag"),
            ("sort", "price-asc"),
            ("per_page", "24"),
        ])
        .to_state();

        assert_eq!(
            listing_href(&state, 3),
            "/products?category=prints&q=tote+bag&sort=price-asc&per_page=24&page=3"
        );
    }

    #[test]
    fn test_stock_label() {
        assert_eq!(stock_label(None), None);
        assert_eq!(stock_label(Some(0)).as_deref(), Some("Sold out"));
        assert_eq!(stock_label(Some(3)).as_deref(), Some("Only 3 left"));
        assert_eq!(stock_label(Some(40)).as_deref(), Some("In stock"));
    }

    #[test]
    fn test_product_href_encodes_id() {
        assert_eq!(product_href(&ProductId::new("42")), "/products/42");
        assert_eq!(product_href(&ProductId::new("a b")), "/products/a%20b");
    }

    #[test]
    fn test_selection_from_query_ignores_unknown_options() {
        let mut product = Product::new("1", "Tee", Decimal::new(2000, 2)).with_stock(3);
        product.colors = vec!["black".to_string(), "white".to_string()];

        let selection = selection_from_query(
            &product,
            &SelectionQuery {
                color: Some("white".to_string()),
                size: Some("XXL".to_string()),
                text: Some("Hi".to_string()),
                qty: Some("9".to_string()),
            },
        );
        assert_eq!(selection.color(), Some("white"));
        assert_eq!(selection.size(), None);
        assert_eq!(selection.custom_text(), Some("Hi"));
        assert_eq!(selection.quantity(), 3);
    }

    #[test]
    fn test_detail_view_quantity_links() {
        let product = Product::new("7", "Zine", Decimal::new(800, 2)).with_stock(2);
        let mut selection = ProductSelection::for_product(&product);
        selection.set_quantity(2);

        let view = ProductDetailView::new(&product, &selection, CurrencyCode::USD);
        assert_eq!(view.price, "$8.00");
        assert_eq!(view.decrement_href.as_deref(), Some("/products/7?qty=1"));
        assert_eq!(view.increment_href, None);
        assert_eq!(view.max_quantity, Some(2));
    }
}
