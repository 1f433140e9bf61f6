//! Product listing: filter, sort and paginate a fetched product set.
//!
//! The listing page fetches every active product once and derives the
//! visible slice from a [`ListingState`]:
//!
//! ```text
//! products ──► category filter ──► search filter ──► sort ──► page slice
//! ```
//!
//! Changing the category, search term, sort key or page size always sends
//! the visitor back to page 1.

use core::fmt;
use core::str::FromStr;

use crate::pagination::{PageLink, page_links, total_pages};
use crate::types::{CategoryFilter, Product};

/// Page sizes offered to visitors.
pub const PAGE_SIZES: [usize; 4] = [8, 12, 16, 24];

/// Page size used when none (or an unsupported one) is requested.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Most recently created first.
    ///
    /// Sorted by creation timestamp, newest first. Rows without a timestamp
    /// follow the timestamped ones in fetch order.
    #[default]
    Newest,
    /// Alphabetical by name, ignoring case.
    Name,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    /// All sort keys, in the order offered to visitors.
    pub const ALL: [Self; 4] = [Self::Newest, Self::Name, Self::PriceAsc, Self::PriceDesc];

    /// Value used in URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Name => "name",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Name => "Name",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
        }
    }

    /// Parse a sort key, falling back to [`SortKey::Newest`].
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "newest" => Ok(Self::Newest),
            "name" => Ok(Self::Name),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

/// Visitor-controlled listing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    category: CategoryFilter,
    search: String,
    sort: SortKey,
    page_size: usize,
    page: usize,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            search: String::new(),
            sort: SortKey::Newest,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl ListingState {
    /// Rebuild a state from URL parameters without resetting the page.
    #[must_use]
    pub fn restore(
        category: CategoryFilter,
        search: &str,
        sort: SortKey,
        page_size: usize,
        page: usize,
    ) -> Self {
        Self {
            category,
            search: search.trim().to_string(),
            sort,
            page_size: normalize_page_size(page_size),
            page: page.max(1),
        }
    }

    #[must_use]
    pub const fn category(&self) -> &CategoryFilter {
        &self.category
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub const fn sort(&self) -> SortKey {
        self.sort
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Requested 1-based page (before clamping to the result size).
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_string();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.page = 1;
    }

    /// Unsupported sizes fall back to [`DEFAULT_PAGE_SIZE`].
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = normalize_page_size(page_size);
        self.page = 1;
    }

    /// Move to a page. Page 0 is treated as page 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Produce the slice of `products` to render.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> ListingPage<'a> {
        let mut matches = filter_products(products, &self.category, &self.search);
        sort_products(&mut matches, self.sort);

        let total_matches = matches.len();
        let total_pages = total_pages(total_matches, self.page_size);
        let page = self.page.min(total_pages);
        let items = matches
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        ListingPage {
            items,
            page,
            total_pages,
            total_matches,
            links: page_links(page, total_pages),
        }
    }
}

/// The rendered slice of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage<'a> {
    pub items: Vec<&'a Product>,
    /// Effective 1-based page, clamped to `total_pages`.
    pub page: usize,
    pub total_pages: usize,
    /// Products matching the filters across all pages.
    pub total_matches: usize,
    pub links: Vec<PageLink>,
}

impl ListingPage<'_> {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

fn normalize_page_size(page_size: usize) -> usize {
    if PAGE_SIZES.contains(&page_size) {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Keep products in `category` whose name or category contains `search`
/// (case-insensitive). Fetch order is preserved.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    category: &CategoryFilter,
    search: &str,
) -> Vec<&'a Product> {
    let needle = search.trim().to_lowercase();
    products
        .iter()
        .filter(|product| category.matches(&product.category))
        .filter(|product| needle.is_empty() || matches_search(product, &needle))
        .collect()
}

fn matches_search(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.category.slug().to_lowercase().contains(needle)
        || product.category.label().to_lowercase().contains(needle)
}

/// Sort products in place. Every order is stable.
pub fn sort_products(products: &mut [&Product], sort: SortKey) {
    match sort {
        SortKey::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Name => products.sort_by_cached_key(|product| product.name.to_lowercase()),
        SortKey::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
    }
}
