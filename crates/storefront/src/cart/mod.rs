//! Shopping cart state container.
//!
//! [`CartState`] wraps the domain [`Cart`] with a [`CartStorage`] slot:
//!
//! - Opening a cart reads and validates the stored payload. Malformed data
//!   (bad JSON, zero quantities) is discarded and the slot cleared.
//! - Every mutation that changes the cart writes the full cart back.
//! - Subtotal and item count are recomputed after each change.
//!
//! Revalidation against the live catalog lives in [`reconcile`].

pub mod reconcile;
pub mod storage;

use pressmark_core::{Cart, CartItem, ProductId};
use rust_decimal::Decimal;

pub use reconcile::{FailedCheck, ReconcileReport, Reconciler, RemovalReason, RemovedLine};
pub use storage::{CartStorage, MemoryCartStorage, SessionCartStorage};

/// A cart bound to the storage it persists to.
#[derive(Debug)]
pub struct CartState<S: CartStorage> {
    cart: Cart,
    storage: S,
    subtotal: Decimal,
    total_items: u64,
    discarded: bool,
}

impl<S: CartStorage> CartState<S> {
    /// Open the cart held in `storage`.
    pub fn open(mut storage: S) -> Self {
        let mut discarded = false;

        let cart = match storage.load() {
            None => Cart::new(),
            Some(payload) => match parse_payload(&payload) {
                Ok(cart) => cart,
                Err(reason) => {
                    tracing::warn!(%reason, "Discarding malformed stored cart");
                    storage.clear();
                    discarded = true;
                    Cart::new()
                }
            },
        };

        let mut state = Self {
            cart,
            storage,
            subtotal: Decimal::ZERO,
            total_items: 0,
            discarded,
        };
        state.recompute();
        state
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Whether malformed stored data was thrown away on open.
    #[must_use]
    pub const fn was_discarded(&self) -> bool {
        self.discarded
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Add `item`, merging with an existing line of the same id.
    ///
    /// `quantity` defaults to 1; `Some(0)` adds nothing.
    pub fn add(&mut self, item: CartItem, quantity: Option<u32>) -> bool {
        let changed = self.cart.add(item, quantity);
        self.commit(changed)
    }

    /// Remove the line with `id`.
    pub fn remove(&mut self, id: &ProductId) -> Option<CartItem> {
        let removed = self.cart.remove(id);
        self.commit(removed.is_some());
        removed
    }

    /// Set the quantity of the line with `id`. Quantities below 1 are
    /// ignored; use [`CartState::remove`] to drop a line.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        let changed = self.cart.set_quantity(id, quantity);
        self.commit(changed)
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> bool {
        let changed = self.cart.clear();
        self.commit(changed)
    }

    /// Drop every line the report marks as removed.
    pub fn apply_reconciliation(&mut self, report: &ReconcileReport) -> Vec<CartItem> {
        let removed: Vec<CartItem> = report
            .removed
            .iter()
            .filter_map(|line| self.cart.remove(&line.id))
            .collect();
        self.commit(!removed.is_empty());
        removed
    }

    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.recompute();
            self.persist();
        }
        changed
    }

    fn recompute(&mut self) {
        self.subtotal = self.cart.subtotal();
        self.total_items = self.cart.total_items();
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.cart) {
            Ok(payload) => self.storage.save(payload),
            Err(e) => tracing::error!(error = %e, "Failed to serialize cart"),
        }
    }
}

/// Decode a stored payload into a cart.
fn parse_payload(payload: &str) -> Result<Cart, String> {
    let items: Vec<CartItem> = serde_json::from_str(payload).map_err(|e| e.to_string())?;
    Cart::from_items(items).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pressmark_core::{Customization, Product};

    use super::*;

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem::from_product(&Product::new(id, format!("Item {id}"), Decimal::new(cents, 2)))
    }

    fn stored(state: &CartState<MemoryCartStorage>) -> Vec<CartItem> {
        serde_json::from_str(&state.storage().load().unwrap()).unwrap()
    }

    #[test]
    fn test_open_empty_storage() {
        let state = CartState::open(MemoryCartStorage::new());
        assert!(state.items().is_empty());
        assert_eq!(state.total_items(), 0);
        assert_eq!(state.subtotal(), Decimal::ZERO);
        assert!(!state.was_discarded());
    }

    #[test]
    fn test_add_persists_and_merges() {
        let mut state = CartState::open(MemoryCartStorage::new());

        assert!(state.add(item("1", 1000), None));
        assert!(state.add(item("1", 1000), Some(2)));
        assert!(state.add(item("2", 250), Some(1)));

        assert_eq!(state.items().len(), 2);
        assert_eq!(state.total_items(), 4);
        assert_eq!(state.subtotal(), Decimal::new(3250, 2));

        let persisted = stored(&state);
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].quantity, 3);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut state = CartState::open(MemoryCartStorage::new());
        assert!(!state.add(item("1", 100), Some(0)));
        assert!(state.items().is_empty());
        assert_eq!(state.storage().load(), None);
    }

    #[test]
    fn test_reopen_restores_cart() {
        let mut state = CartState::open(MemoryCartStorage::new());
        state.add(
            item("1", 500).with_customization(Customization {
                text: Some("For Sam".to_string()),
                ..Customization::default()
            }),
            Some(2),
        );

        let reopened = CartState::open(state.storage().clone());
        assert_eq!(reopened.cart(), state.cart());
        assert_eq!(reopened.total_items(), 2);
    }

    #[test]
    fn test_malformed_payload_is_discarded() {
        let state = CartState::open(MemoryCartStorage::with_payload("{not json"));
        assert!(state.items().is_empty());
        assert!(state.was_discarded());
        assert_eq!(state.storage().load(), None);
    }

    #[test]
    fn test_zero_quantity_payload_is_discarded() {
        let payload = r#"[{"id":"1","name":"A","price":"1.00","quantity":0,"image":null}]"#;
        let state = CartState::open(MemoryCartStorage::with_payload(payload));
        assert!(state.items().is_empty());
        assert!(state.was_discarded());
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut state = CartState::open(MemoryCartStorage::new());
        state.add(item("1", 100), Some(1));

        assert!(state.set_quantity(&ProductId::new("1"), 5));
        assert_eq!(state.total_items(), 5);

        assert!(!state.set_quantity(&ProductId::new("1"), 0));
        assert_eq!(state.total_items(), 5);

        assert!(state.remove(&ProductId::new("1")).is_some());
        assert!(state.items().is_empty());
        assert_eq!(stored(&state), Vec::<CartItem>::new());
    }

    #[test]
    fn test_clear() {
        let mut state = CartState::open(MemoryCartStorage::new());
        state.add(item("1", 100), None);
        assert!(state.clear());
        assert!(!state.clear());
        assert_eq!(state.total_items(), 0);
    }

    #[test]
    fn test_apply_reconciliation() {
        let mut state = CartState::open(MemoryCartStorage::new());
        state.add(item("1", 100), None);
        state.add(item("2", 200), None);

        let report = ReconcileReport {
            removed: vec![RemovedLine {
                id: ProductId::new("2"),
                name: "Item 2".to_string(),
                reason: RemovalReason::Missing,
            }],
            failed: Vec::new(),
        };

        let removed = state.apply_reconciliation(&report);
        assert_eq!(removed.len(), 1);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.subtotal(), Decimal::new(100, 2));
        assert_eq!(stored(&state).len(), 1);
    }
}
