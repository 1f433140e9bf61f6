//! Cart lines and the cart collection.
//!
//! ## Invariants
//! - A cart holds at most one line per product id (adding the same product
//!   again increases the quantity)
//! - Every line has a quantity of at least 1
//! - Lines keep insertion order

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::Category;
use super::id::ProductId;
use super::product::Product;

/// Errors raised when restoring a cart from stored lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A stored line has a quantity of zero.
    #[error("line {0} has a zero quantity")]
    ZeroQuantity(ProductId),
}

/// What a cart line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A catalog product.
    #[default]
    Product,
    /// A print job configured with [`PrintOptions`].
    PrintJob,
}

/// Personalisation chosen on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customization {
    pub text: Option<String>,
    pub font: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl Customization {
    /// Whether no personalisation was chosen at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none() && self.font.is_none() && self.color.is_none() && self.size.is_none()
    }
}

/// Options of a print job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOptions {
    /// Print on both sides of the sheet.
    pub duplex: bool,
    /// Print in color rather than black and white.
    pub color: bool,
    pub paper_type: String,
    pub size: String,
    pub copies: u32,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            duplex: false,
            color: false,
            paper_type: "standard".to_string(),
            size: "A4".to_string(),
            copies: 1,
        }
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price captured when the line was added.
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub customization: Option<Customization>,
    #[serde(default)]
    pub print_options: Option<PrintOptions>,
}

impl CartItem {
    /// Create a plain product line with a quantity of 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            image: product.image_url.clone(),
            kind: ItemKind::Product,
            category: Some(product.category.clone()),
            customization: None,
            print_options: None,
        }
    }

    /// Attach personalisation, ignoring an empty one.
    #[must_use]
    pub fn with_customization(mut self, customization: Customization) -> Self {
        self.customization = (!customization.is_empty()).then_some(customization);
        self
    }

    /// Turn the line into a print job.
    #[must_use]
    pub fn into_print_job(mut self, options: PrintOptions) -> Self {
        self.kind = ItemKind::PrintJob;
        self.print_options = Some(options);
        self
    }

    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An ordered collection of cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Restore a cart from stored lines.
    ///
    /// Lines sharing an id are merged in order of first appearance.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] if any line has a zero quantity.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartError> {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                return Err(CartError::ZeroQuantity(item.id));
            }
            let quantity = item.quantity;
            cart.add(item, Some(quantity));
        }
        Ok(cart)
    }

    /// Add `quantity` (default 1) of `item`.
    ///
    /// An existing line with the same id has its quantity increased; the
    /// incoming line's other fields are ignored in that case. Returns `false`
    /// without changing anything when `quantity` is zero.
    pub fn add(&mut self, mut item: CartItem, quantity: Option<u32>) -> bool {
        let quantity = quantity.unwrap_or(1);
        if quantity == 0 {
            return false;
        }

        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            item.quantity = quantity;
            self.items.push(item);
        }
        true
    }

    /// Replace the quantity of the line with `id`.
    ///
    /// Quantities below 1 and unknown ids are ignored. Returns whether the
    /// line changed.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        if quantity < 1 {
            return false;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        match self.items.iter_mut().find(|line| &line.id == id) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove the line with `id`, if present.
    pub fn remove(&mut self, id: &ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|line| &line.id == id)?;
        Some(self.items.remove(index))
    }

    /// Remove every line. Returns whether the cart had any lines.
    pub fn clear(&mut self) -> bool {
        let had_items = !self.items.is_empty();
        self.items.clear();
        had_items
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
