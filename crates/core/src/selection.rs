//! Product detail selection.
//!
//! Tracks what a visitor has picked on a product page (color, size, custom
//! text and quantity) and guards add-to-cart against the known stock level.

use thiserror::Error;

use crate::types::{Customization, Product};

/// Reasons an add-to-cart request is refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// More units requested than the backend reports in stock.
    #[error("only {available} left in stock (requested {requested})")]
    InsufficientStock { requested: u64, available: u32 },

    /// Quantities below 1 cannot be added.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Choices made on a product detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSelection {
    color: Option<String>,
    size: Option<String>,
    custom_text: Option<String>,
    quantity: u32,
    stock: Option<u32>,
}

impl ProductSelection {
    /// Fresh selection for `product`: first color and size preselected,
    /// quantity 1.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self {
            color: product.colors.first().cloned(),
            size: product.sizes.first().cloned(),
            custom_text: None,
            quantity: 1,
            stock: product.stock,
        }
    }

    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    #[must_use]
    pub fn size(&self) -> Option<&str> {
        self.size.as_deref()
    }

    #[must_use]
    pub fn custom_text(&self) -> Option<&str> {
        self.custom_text.as_deref()
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub const fn stock(&self) -> Option<u32> {
        self.stock
    }

    /// Select a color. Blank values clear the selection.
    pub fn set_color(&mut self, color: &str) {
        self.color = non_blank(color);
    }

    /// Select a size. Blank values clear the selection.
    pub fn set_size(&mut self, size: &str) {
        self.size = non_blank(size);
    }

    /// Set the custom text. Blank values clear it.
    pub fn set_custom_text(&mut self, text: &str) {
        self.custom_text = non_blank(text);
    }

    /// Set the quantity, clamped to `1..=stock` when stock is known and to
    /// at least 1 otherwise.
    pub fn set_quantity(&mut self, quantity: i64) {
        let quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        self.quantity = match self.stock {
            Some(stock) => quantity.min(stock.max(1)),
            None => quantity,
        };
    }

    pub fn increment(&mut self) {
        self.set_quantity(i64::from(self.quantity) + 1);
    }

    pub fn decrement(&mut self) {
        self.set_quantity(i64::from(self.quantity) - 1);
    }

    /// Whether the quantity can still be increased.
    #[must_use]
    pub fn can_increment(&self) -> bool {
        self.stock.is_none_or(|stock| self.quantity < stock)
    }

    /// Check that `requested` more units may be added to a cart that
    /// already holds `in_cart` of this product.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidQuantity`] for quantities below 1
    /// and [`SelectionError::InsufficientStock`] when the resulting line
    /// quantity exceeds the known stock.
    pub fn check_add(&self, in_cart: u32, requested: i64) -> Result<u32, SelectionError> {
        if requested < 1 {
            return Err(SelectionError::InvalidQuantity);
        }
        let requested = u32::try_from(requested).map_err(|_| SelectionError::InvalidQuantity)?;
        check_stock(self.stock, u64::from(in_cart) + u64::from(requested))?;
        Ok(requested)
    }

    /// Personalisation to attach to the cart line.
    #[must_use]
    pub fn customization(&self) -> Customization {
        Customization {
            text: self.custom_text.clone(),
            font: None,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Check that a cart line of `line_quantity` units fits within `stock`.
///
/// # Errors
///
/// Returns [`SelectionError::InsufficientStock`] when the stock is known and
/// smaller than `line_quantity`.
pub fn check_stock(stock: Option<u32>, line_quantity: u64) -> Result<(), SelectionError> {
    match stock {
        Some(available) if line_quantity > u64::from(available) => {
            Err(SelectionError::InsufficientStock {
                requested: line_quantity,
                available,
            })
        }
        _ => Ok(()),
    }
}
