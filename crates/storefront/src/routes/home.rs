//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use pressmark_core::carousel::Carousel;
use pressmark_core::{Category, CurrencyCode, Product};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::routes::products::ProductCardView;
use crate::routes::{LayoutView, page_layout};
use crate::state::AppState;

/// Featured products fetched for the carousel.
const FEATURED_LIMIT: usize = 12;

/// Products shown under "New arrivals".
const LATEST_LIMIT: usize = 8;

// =============================================================================
// Featured Carousel
// =============================================================================

/// A page indicator under the carousel.
#[derive(Clone)]
pub struct CarouselDot {
    pub number: usize,
    pub start: usize,
    pub active: bool,
}

/// Featured carousel display data.
#[derive(Clone)]
pub struct FeaturedView {
    pub slides: Vec<ProductCardView>,
    /// Controls and auto-advance only render when enabled.
    pub enabled: bool,
    pub start: usize,
    pub prev_start: usize,
    pub next_start: usize,
    pub dots: Vec<CarouselDot>,
    pub autoplay_ms: u32,
}

impl FeaturedView {
    /// Window over `products` starting at `start`.
    #[must_use]
    pub fn new(products: &[Product], start: usize, currency: CurrencyCode, autoplay_ms: u32) -> Self {
        let carousel = Carousel::new(products.len()).starting_at(start);

        let slides = carousel
            .visible()
            .into_iter()
            .filter_map(|index| products.get(index))
            .map(|product| ProductCardView::new(product, currency, "/"))
            .collect();

        let current_page = carousel.current_page();
        let dots = if carousel.is_enabled() {
            (0..carousel.page_count())
                .map(|page| {
                    let mut target = carousel;
                    target.go_to_page(page);
                    CarouselDot {
                        number: page + 1,
                        start: target.start(),
                        active: page == current_page,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            slides,
            enabled: carousel.is_enabled(),
            start: carousel.start(),
            prev_start: carousel.prev_start(),
            next_start: carousel.next_start(),
            dots,
            autoplay_ms,
        }
    }
}

/// Carousel position query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct CarouselQuery {
    pub start: Option<String>,
}

impl CarouselQuery {
    fn start(&self) -> usize {
        self.start
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// A category shortcut on the home page.
#[derive(Clone)]
pub struct CategoryLink {
    pub href: String,
    pub label: String,
    pub badge_class: &'static str,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: LayoutView,
    pub featured: FeaturedView,
    pub latest: Vec<ProductCardView>,
    pub categories: Vec<CategoryLink>,
}

/// Featured carousel fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/featured.html")]
pub struct FeaturedTemplate {
    pub featured: FeaturedView,
}

fn category_links() -> Vec<CategoryLink> {
    Category::KNOWN
        .iter()
        .map(|category| CategoryLink {
            href: format!("/products?category={}", category.slug()),
            label: category.label().to_string(),
            badge_class: category.badge_class(),
        })
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display home page.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CarouselQuery>,
) -> Result<impl IntoResponse> {
    let mut layout = page_layout(&session).await?;
    let currency = state.currency();

    let featured = match state.catalog().featured_products(FEATURED_LIMIT).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch featured products");
            layout.catalog_error(&e);
            Vec::new()
        }
    };

    let latest = match state.catalog().latest_products(LATEST_LIMIT).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch latest products");
            layout.catalog_error(&e);
            Vec::new()
        }
    };

    Ok(HomeTemplate {
        layout,
        featured: FeaturedView::new(
            &featured,
            query.start(),
            currency,
            state.config().featured_autoplay_ms,
        ),
        latest: latest
            .iter()
            .map(|product| ProductCardView::new(product, currency, "/"))
            .collect(),
        categories: category_links(),
    })
}

/// Featured carousel window (fragment, polled for auto-advance).
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(query): Query<CarouselQuery>,
) -> impl IntoResponse {
    let products = state
        .catalog()
        .featured_products(FEATURED_LIMIT)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch featured products");
            Vec::new()
        });

    FeaturedTemplate {
        featured: FeaturedView::new(
            &products,
            query.start(),
            state.currency(),
            state.config().featured_autoplay_ms,
        ),
    }
}
