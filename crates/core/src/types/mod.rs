//! Core types for Pressmark.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod category;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartError, CartItem, Customization, ItemKind, PrintOptions};
pub use category::{Category, CategoryFilter};
pub use id::ProductId;
pub use price::{CurrencyCode, Price};
pub use product::Product;
