//! Session-related types.

/// Session keys for visitor state.
pub mod keys {
    /// Key for the serialized cart (JSON array of cart lines).
    pub const CART: &str = "pressmark.cart";

    /// Key for flash notices shown on the next rendered page.
    pub const FLASH: &str = "flash";
}
