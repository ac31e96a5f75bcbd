//! Pure order-total computation.
//!
//! [`quote`] turns a cart snapshot plus promo state into
//! subtotal/tax/discount/total. It is deterministic and side-effect free:
//! recomputing on every render with unchanged inputs yields identical
//! outputs bit for bit. Internal arithmetic is full-precision `Decimal`;
//! rounding to two decimal places happens only at presentation
//! ([`Totals::rounded`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::types::money::round2;

/// Errors from promo code validation.
#[derive(Debug, Error)]
pub enum PromoError {
    /// The code is not recognized. Non-fatal: the caller resets the discount
    /// to zero and shows UI-level feedback.
    #[error("invalid promo code: {0}")]
    InvalidPromo(String),
}

/// Session-scoped promo state. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoState {
    pub code: String,
    /// Discount fraction in `[0, 1)`.
    pub discount_fraction: Decimal,
}

impl PromoState {
    /// No promo active: zero discount.
    #[must_use]
    pub fn none() -> Self {
        Self {
            code: String::new(),
            discount_fraction: Decimal::ZERO,
        }
    }

    /// Validate a user-entered promo code.
    ///
    /// The only recognized code is the literal `save10` (case-insensitive,
    /// trimmed), worth a 10% discount.
    ///
    /// # Errors
    ///
    /// Returns [`PromoError::InvalidPromo`] for anything else.
    pub fn parse(input: &str) -> Result<Self, PromoError> {
        let code = input.trim().to_lowercase();
        if code == "save10" {
            Ok(Self {
                code,
                discount_fraction: Decimal::new(10, 2), // 0.10
            })
        } else {
            Err(PromoError::InvalidPromo(input.trim().to_owned()))
        }
    }
}

/// Computed monetary totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    /// Shipping is always free in this storefront; carried so the order
    /// record and API responses state it explicitly.
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Flat tax rate applied to every order subtotal: 2%.
fn tax_rate() -> Decimal {
    Decimal::new(2, 2)
}

/// Compute totals for a cart snapshot under the given promo state.
#[must_use]
pub fn quote(cart: &Cart, promo: &PromoState) -> Totals {
    quote_subtotal(cart.amount(), promo)
}

/// Compute totals from a pre-summed subtotal.
///
/// The order builder uses this with its own authoritatively re-priced line
/// totals so cart display and order persistence share one formula. `total`
/// is floored at zero so a misconfigured discount can never produce a
/// negative charge.
#[must_use]
pub fn quote_subtotal(subtotal: Decimal, promo: &PromoState) -> Totals {
    let tax = subtotal * tax_rate();
    let discount = subtotal * promo.discount_fraction;
    let total = (subtotal + tax - discount).max(Decimal::ZERO);

    Totals {
        subtotal,
        tax,
        discount,
        shipping: Decimal::ZERO,
        total,
    }
}

impl Totals {
    /// Zero totals for an empty cart.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// Presentation copy with every field rounded to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round2(self.subtotal),
            tax: round2(self.tax),
            discount: round2(self.discount),
            shipping: round2(self.shipping),
            total: round2(self.total),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::ProductSnapshot;
    use crate::types::ProductId;

    fn cart_with(price: i64, quantity: u32) -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            ProductSnapshot {
                id: Some(ProductId::generate()),
                name: "P1".to_owned(),
                price: Decimal::new(price, 0),
                offer_price: None,
                image_url: None,
            },
            quantity,
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_no_promo_scenario() {
        // cart = {P1: price 100, qty 2} -> subtotal 200, tax 4, total 204
        let totals = quote(&cart_with(100, 2), &PromoState::none());

        assert_eq!(totals.subtotal, Decimal::new(200, 0));
        assert_eq!(totals.tax, Decimal::new(4, 0));
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(204, 0));
    }

    #[test]
    fn test_mixed_case_promo_scenario() {
        // cart = {P1: price 100, qty 1}, promo "SAVE10" -> total 100 + 2 - 10 = 92
        let promo = PromoState::parse("  SAVE10 ").unwrap();
        let totals = quote(&cart_with(100, 1), &promo);

        assert_eq!(totals.discount, Decimal::new(10, 0));
        assert_eq!(totals.total, Decimal::new(92, 0));
    }

    #[test]
    fn test_unknown_promo_is_invalid() {
        let err = PromoState::parse("save20").unwrap_err();
        assert!(matches!(err, PromoError::InvalidPromo(_)));
    }

    #[test]
    fn test_promo_discount_is_exactly_ten_percent() {
        let promo = PromoState::parse("save10").unwrap();
        let totals = quote(&cart_with(333, 3), &promo);

        assert_eq!(totals.discount, totals.subtotal * Decimal::new(10, 2));
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let cart = cart_with(19, 7);
        let promo = PromoState::parse("save10").unwrap();

        let first = quote(&cart, &promo);
        let second = quote(&cart, &promo);
        assert_eq!(first, second);
    }

    #[test]
    fn test_total_never_negative() {
        let mut cart = cart_with(100, 1);
        let promo = PromoState {
            code: "broken".to_owned(),
            // Misconfigured discount above 100%
            discount_fraction: Decimal::new(5, 0),
        };

        let totals = quote(&cart, &promo);
        assert_eq!(totals.total, Decimal::ZERO);

        cart.clear();
        assert_eq!(quote(&cart, &PromoState::none()), Totals::zero());
    }

    #[test]
    fn test_empty_cart_quotes_zero() {
        assert_eq!(quote(&Cart::new(), &PromoState::none()), Totals::zero());
    }

    #[test]
    fn test_rounded_is_presentation_only() {
        // 3 x 0.333 = 0.999 subtotal; internal value keeps full precision.
        let mut cart = Cart::new();
        cart.add_item(
            ProductSnapshot {
                id: Some(ProductId::generate()),
                name: "Sliver".to_owned(),
                price: Decimal::new(333, 3),
                offer_price: None,
                image_url: None,
            },
            3,
        )
        .unwrap();

        let totals = quote(&cart, &PromoState::none());
        assert_eq!(totals.subtotal, Decimal::new(999, 3));
        assert_eq!(totals.rounded().subtotal, Decimal::new(100, 2));
    }
}
