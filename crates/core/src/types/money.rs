//! Money helpers built on decimal arithmetic.
//!
//! All monetary values are `rust_decimal::Decimal` at full precision.
//! Rounding happens exactly once, at the presentation boundary, so repeated
//! recomputation never compounds rounding error.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to two decimal places for presentation.
///
/// Uses half-away-from-zero rounding, the usual convention for prices.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Serde helper: serialize a `Decimal` rounded to two decimal places.
///
/// Apply with `#[serde(serialize_with = "money::serialize_round2")]` on
/// fields that leave the process (API responses); internal persistence keeps
/// full precision.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_round2<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serde::Serialize::serialize(&round2(*amount), serializer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(Decimal::new(12345, 3)), Decimal::new(1235, 2)); // 12.345 -> 12.35
        assert_eq!(round2(Decimal::new(-12345, 3)), Decimal::new(-1235, 2));
    }

    #[test]
    fn test_round2_is_idempotent() {
        let amount = Decimal::new(9999, 3); // 9.999
        assert_eq!(round2(round2(amount)), round2(amount));
    }
}
