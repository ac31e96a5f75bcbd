//! The cart state machine.
//!
//! A [`Cart`] is the per-session working set of intended purchases: a mapping
//! from product ID to [`CartItem`], mutated by add/update/remove and cleared
//! on checkout. It is pure state - persistence and server synchronization
//! live in the storefront crate.
//!
//! # Invariants
//!
//! - No entry has quantity zero; removing is always done by deleting the
//!   entry, never by storing a zero.
//! - `amount()` never panics on malformed entries (carts round-trip through
//!   persisted JSON that older clients may have written); bad price data is
//!   priced at zero instead.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The supplied product cannot be added to a cart.
    #[error("invalid cart item: {0}")]
    InvalidItem(String),
}

/// The slice of a product a cart captures when an item is added.
///
/// Prices are captured at add time; the order builder re-resolves them from
/// the catalog at checkout, so these are display values only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product identifier. Optional because snapshots can arrive from
    /// untrusted client JSON; a missing ID is rejected as `InvalidItem`.
    pub id: Option<ProductId>,
    pub name: String,
    /// List price.
    pub price: Decimal,
    /// Discounted price, preferred over `price` when present.
    pub offer_price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// One cart line: a product snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// List price captured when the item was added.
    pub unit_price: Decimal,
    /// Discounted price, preferred over `unit_price` when present.
    pub offer_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// The price this line is charged at: offer price if present and sane,
    /// else list price, else zero.
    ///
    /// Negative values can only come from tampered persisted state; they are
    /// treated as absent rather than propagated into totals.
    #[must_use]
    pub fn effective_unit_price(&self) -> Decimal {
        match self.offer_price {
            Some(p) if p >= Decimal::ZERO => p,
            _ if self.unit_price >= Decimal::ZERO => self.unit_price,
            _ => Decimal::ZERO,
        }
    }

    /// Effective unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.effective_unit_price() * Decimal::from(self.quantity)
    }
}

/// A session cart: product ID -> cart line.
///
/// Keys are unique and insertion order is irrelevant; serialization is the
/// bare mapping so persisted carts stay a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: BTreeMap<ProductId, CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product to the cart.
    ///
    /// If the product is already present its quantity is incremented by
    /// `quantity`; otherwise a new line is inserted capturing the snapshot's
    /// price fields.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidItem`] if the snapshot has no product ID
    /// or `quantity` is zero. The cart is unchanged on error.
    pub fn add_item(
        &mut self,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<&CartItem, CartError> {
        let Some(product_id) = product.id else {
            return Err(CartError::InvalidItem("missing product id".to_owned()));
        };
        if quantity == 0 {
            return Err(CartError::InvalidItem("quantity must be positive".to_owned()));
        }

        let item = self
            .items
            .entry(product_id)
            .and_modify(|existing| {
                existing.quantity = existing.quantity.saturating_add(quantity);
            })
            .or_insert_with(|| CartItem {
                product_id,
                name: product.name,
                unit_price: product.price,
                offer_price: product.offer_price,
                image_url: product.image_url,
                quantity,
            });

        Ok(item)
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero or less removes the line. An absent product ID is
    /// a no-op, not an error.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.items.remove(&product_id);
            return;
        }

        if let Some(item) = self.items.get_mut(&product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Remove a line. Idempotent; removing an absent ID is a no-op.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.remove(&product_id);
    }

    /// Total quantity across all lines. Used for UI badges.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.values().map(|item| u64::from(item.quantity)).sum()
    }

    /// Total effective price across all lines.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.items.values().map(CartItem::line_total).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reset to empty (checkout success, logout).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop lines that violate the quantity invariant.
    ///
    /// Called after deserializing persisted state, which may have been
    /// written by older code that stored zero-quantity entries.
    pub fn retain_valid(&mut self) {
        self.items.retain(|_, item| item.quantity > 0);
    }

    /// Iterate lines in key order.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    /// Look up a line by product ID.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.get(&product_id)
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|item| (item.product_id, item))
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(id: ProductId, price: i64, offer: Option<i64>) -> ProductSnapshot {
        ProductSnapshot {
            id: Some(id),
            name: "Widget".to_owned(),
            price: Decimal::new(price, 0),
            offer_price: offer.map(|o| Decimal::new(o, 0)),
            image_url: None,
        }
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let id = ProductId::generate();
        let mut cart = Cart::new();

        cart.add_item(snapshot(id, 100, None), 1).unwrap();
        assert_eq!(cart.get(id).unwrap().quantity, 1);

        cart.add_item(snapshot(id, 100, None), 2).unwrap();
        assert_eq!(cart.get(id).unwrap().quantity, 3);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_add_rejects_missing_id() {
        let mut cart = Cart::new();
        let mut product = snapshot(ProductId::generate(), 100, None);
        product.id = None;

        let err = cart.add_item(product, 1).unwrap_err();
        assert!(matches!(err, CartError::InvalidItem(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let err = cart
            .add_item(snapshot(ProductId::generate(), 100, None), 0)
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidItem(_)));
    }

    #[test]
    fn test_update_quantity_sets_exactly() {
        let id = ProductId::generate();
        let mut cart = Cart::new();
        cart.add_item(snapshot(id, 100, None), 5).unwrap();

        cart.update_quantity(id, 2);
        assert_eq!(cart.get(id).unwrap().quantity, 2);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let id = ProductId::generate();
        let mut cart = Cart::new();
        cart.add_item(snapshot(id, 100, None), 5).unwrap();

        cart.update_quantity(id, 0);
        assert!(cart.get(id).is_none());
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_update_quantity_negative_removes() {
        let id = ProductId::generate();
        let mut cart = Cart::new();
        cart.add_item(snapshot(id, 100, None), 1).unwrap();

        cart.update_quantity(id, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_absent_id_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(snapshot(ProductId::generate(), 100, None), 1)
            .unwrap();

        cart.update_quantity(ProductId::generate(), 4);
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let id = ProductId::generate();
        let mut cart = Cart::new();
        cart.add_item(snapshot(id, 100, None), 1).unwrap();

        cart.remove_item(id);
        cart.remove_item(id);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_count_matches_final_quantities() {
        let a = ProductId::generate();
        let b = ProductId::generate();
        let mut cart = Cart::new();

        cart.add_item(snapshot(a, 10, None), 2).unwrap();
        cart.add_item(snapshot(b, 20, None), 1).unwrap();
        cart.update_quantity(a, 4);
        cart.add_item(snapshot(b, 20, None), 3).unwrap();
        cart.remove_item(ProductId::generate());

        assert_eq!(cart.count(), 8);
        assert!(cart.items().all(|item| item.quantity > 0));
    }

    #[test]
    fn test_amount_prefers_offer_price() {
        let id = ProductId::generate();
        let mut cart = Cart::new();
        cart.add_item(snapshot(id, 100, Some(80)), 2).unwrap();

        assert_eq!(cart.amount(), Decimal::new(160, 0));
    }

    #[test]
    fn test_amount_zeroes_malformed_prices() {
        let id = ProductId::generate();
        let cart: Cart = [CartItem {
            product_id: id,
            name: "Tampered".to_owned(),
            unit_price: Decimal::new(-50, 0),
            offer_price: None,
            image_url: None,
            quantity: 3,
        }]
        .into_iter()
        .collect();

        assert_eq!(cart.amount(), Decimal::ZERO);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_serde_round_trip_is_plain_object() {
        let id = ProductId::generate();
        let mut cart = Cart::new();
        cart.add_item(snapshot(id, 100, Some(80)), 2).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.starts_with('{'));

        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_malformed_persisted_state_fails_parse_not_panics() {
        // Callers discard unparseable slots and start empty; what matters
        // here is a clean Err, never a panic.
        let malformed = r#"{"not-a-uuid": {"quantity": "three"}}"#;
        assert!(serde_json::from_str::<Cart>(malformed).is_err());
        assert!(serde_json::from_str::<Cart>("[]").is_err());
        assert_eq!(
            serde_json::from_str::<Cart>("{}").unwrap_or_default(),
            Cart::new()
        );
    }

    #[test]
    fn test_retain_valid_drops_zero_quantities() {
        // Simulates state written by an older client that stored zeros.
        let good = ProductId::generate();
        let bad = ProductId::generate();
        let mut cart: Cart = [
            CartItem {
                product_id: good,
                name: "Keep".to_owned(),
                unit_price: Decimal::new(10, 0),
                offer_price: None,
                image_url: None,
                quantity: 1,
            },
            CartItem {
                product_id: bad,
                name: "Drop".to_owned(),
                unit_price: Decimal::new(10, 0),
                offer_price: None,
                image_url: None,
                quantity: 0,
            },
        ]
        .into_iter()
        .collect();

        cart.retain_valid();
        assert!(cart.get(good).is_some());
        assert!(cart.get(bad).is_none());
    }
}
