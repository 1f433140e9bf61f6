//! Featured product carousel.
//!
//! A fixed-size window slides over a circular list of featured products:
//!
//! ```text
//! len = 6, window = 4
//! start 0: [0 1 2 3]
//! next   : [4 5 0 1]
//! next   : [2 3 4 5]
//! ```
//!
//! With `len <= window` everything fits on screen and the carousel is
//! disabled: no controls, no auto-advance, and `next`/`prev` do nothing.

/// Number of products visible at once.
pub const WINDOW_SIZE: usize = 4;

/// Window position over a circular list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    window: usize,
    start: usize,
}

impl Carousel {
    /// Carousel over `len` items with the default window size.
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self::with_window(len, WINDOW_SIZE)
    }

    /// Carousel over `len` items showing `window` at a time.
    #[must_use]
    pub const fn with_window(len: usize, window: usize) -> Self {
        Self {
            len,
            window: if window == 0 { 1 } else { window },
            start: 0,
        }
    }

    /// Start the window at `start` (taken modulo the list length).
    #[must_use]
    pub const fn starting_at(mut self, start: usize) -> Self {
        self.start = if self.is_enabled() { start % self.len } else { 0 };
        self
    }

    /// Whether there are more items than fit in one window.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.len > self.window
    }

    /// Index of the first visible item.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Indices of the visible items, wrapping around the end of the list.
    #[must_use]
    pub fn visible(&self) -> Vec<usize> {
        if !self.is_enabled() {
            return (0..self.len).collect();
        }
        (0..self.window)
            .map(|offset| (self.start + offset) % self.len)
            .collect()
    }

    /// Advance by one window.
    pub const fn next(&mut self) {
        if self.is_enabled() {
            self.start = (self.start + self.window) % self.len;
        }
    }

    /// Step back by one window.
    pub const fn prev(&mut self) {
        if self.is_enabled() {
            let step = self.window % self.len;
            self.start = (self.start + self.len - step) % self.len;
        }
    }

    /// Start index the window would have after [`Carousel::next`].
    #[must_use]
    pub const fn next_start(&self) -> usize {
        let mut next = *self;
        next.next();
        next.start
    }

    /// Start index the window would have after [`Carousel::prev`].
    #[must_use]
    pub const fn prev_start(&self) -> usize {
        let mut prev = *self;
        prev.prev();
        prev.start
    }

    /// Number of selectable pages (`ceil(len / window)`).
    #[must_use]
    pub const fn page_count(&self) -> usize {
        if self.is_enabled() {
            self.len.div_ceil(self.window)
        } else {
            1
        }
    }

    /// Jump to the 0-based `page`.
    pub const fn go_to_page(&mut self, page: usize) {
        if self.is_enabled() {
            self.start = (page % self.page_count()) * self.window % self.len;
        }
    }

    /// 0-based page whose window starts closest to the current position.
    #[must_use]
    pub const fn current_page(&self) -> usize {
        if self.is_enabled() {
            self.start / self.window
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps_around() {
        let mut carousel = Carousel::new(6);
        assert_eq!(carousel.visible(), [0, 1, 2, 3]);

        carousel.next();
        assert_eq!(carousel.start(), 4);
        assert_eq!(carousel.visible(), [4, 5, 0, 1]);
    }

    #[test]
    fn test_prev_wraps_around() {
        let mut carousel = Carousel::new(6);
        carousel.prev();
        assert_eq!(carousel.start(), 2);
        assert_eq!(carousel.visible(), [2, 3, 4, 5]);
    }

    #[test]
    fn test_next_then_prev_returns_to_start() {
        let mut carousel = Carousel::new(10).starting_at(3);
        carousel.next();
        carousel.prev();
        assert_eq!(carousel.start(), 3);
    }

    #[test]
    fn test_disabled_with_four_or_fewer() {
        let mut carousel = Carousel::new(4);
        assert!(!carousel.is_enabled());
        carousel.next();
        carousel.prev();
        carousel.go_to_page(1);
        assert_eq!(carousel.start(), 0);
        assert_eq!(carousel.visible(), [0, 1, 2, 3]);
        assert_eq!(carousel.page_count(), 1);

        assert_eq!(Carousel::new(2).visible(), [0, 1]);
        assert!(Carousel::new(0).visible().is_empty());
    }

    #[test]
    fn test_go_to_page() {
        let mut carousel = Carousel::new(10);
        assert_eq!(carousel.page_count(), 3);

        carousel.go_to_page(2);
        assert_eq!(carousel.start(), 8);
        assert_eq!(carousel.visible(), [8, 9, 0, 1]);
        assert_eq!(carousel.current_page(), 2);

        carousel.go_to_page(3);
        assert_eq!(carousel.start(), 0);
    }

    #[test]
    fn test_starting_at_is_modular() {
        let carousel = Carousel::new(6).starting_at(8);
        assert_eq!(carousel.start(), 2);
        assert_eq!(carousel.next_start(), 0);
        assert_eq!(carousel.prev_start(), 4);
    }
}
