//! Collapsed page-number links.
//!
//! Long page ranges are shown as the first page, the last page, the current
//! page and its immediate neighbours. Gaps between them become an ellipsis:
//!
//! ```text
//! current = 6, total = 12  →  1 … 5 [6] 7 … 12
//! current = 2, total = 4   →  1 [2] 3 4
//! ```

/// One entry in the rendered page-number strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    /// A link to a 1-based page number.
    Page(usize),
    /// Marker for skipped pages.
    Ellipsis,
}

/// Number of pages needed for `item_count` items. Always at least 1.
#[must_use]
pub const fn total_pages(item_count: usize, page_size: usize) -> usize {
    if page_size == 0 || item_count == 0 {
        1
    } else {
        item_count.div_ceil(page_size)
    }
}

/// Build the collapsed page-number strip for `current` out of `total` pages.
///
/// `current` is clamped into `1..=total`.
#[must_use]
pub fn page_links(current: usize, total: usize) -> Vec<PageLink> {
    if total == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);

    let mut pages = vec![1, current.saturating_sub(1), current, current + 1, total];
    pages.retain(|page| (1..=total).contains(page));
    pages.sort_unstable();
    pages.dedup();

    let mut links = Vec::with_capacity(pages.len() * 2);
    let mut previous = 0;
    for page in pages {
        if previous != 0 && page > previous + 1 {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(page));
        previous = page;
    }
    links
}
