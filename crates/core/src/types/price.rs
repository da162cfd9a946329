//! Type-safe price representation using decimal arithmetic.
//!
//! Persisted carts store the unit price as a plain JSON number, so a price
//! passes through an `f64` on every save. To keep save-then-load lossless,
//! every `Price` is normalised on construction to the shortest decimal that
//! names the nearest `f64` (at most 17 significant digits). A normalised
//! amount converts to the same `f64` and back to the same decimal.
//!
//! Supported amounts are those `Decimal` can hold: magnitudes below about
//! 7.9e28, with at most 28 fractional digits. Smaller fractions round to
//! zero.

use std::iter::Sum;
use std::num::NonZeroU32;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A unit price in the store currency's standard unit (dollars, not cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Price(#[serde(with = "float_amount")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price, normalised to what a JSON number can carry.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(normalize(amount))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units at this price.
    #[must_use]
    pub fn times(self, quantity: NonZeroU32) -> Self {
        let total = self
            .0
            .checked_mul(Decimal::from(quantity.get()))
            .unwrap_or(Decimal::MAX);
        Self::new(total)
    }
}

/// Correctly rounded conversion; `Decimal::to_f64` may be off by an ulp.
fn to_f64(amount: Decimal) -> f64 {
    amount
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| amount.to_f64())
        .unwrap_or_default()
}

/// Shortest decimal that round-trips through the nearest `f64`.
fn normalize(amount: Decimal) -> Decimal {
    Decimal::from_str(&to_f64(amount).to_string()).unwrap_or(amount)
}

/// JSON number encoding for price amounts.
///
/// Reading goes through `rust_decimal`'s float visitor, which parses the
/// shortest `f64` representation, matching [`normalize`].
mod float_amount {
    use rust_decimal::Decimal;
    use serde::{Serialize, Serializer};

    pub use rust_decimal::serde::float::deserialize;

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        super::to_f64(*amount).serialize(serializer)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self::new(iter.fold(Decimal::ZERO, |total, p| {
            total.checked_add(p.0).unwrap_or(Decimal::MAX)
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).amount(), Decimal::new(1999, 2));
        assert_eq!(Price::from_cents(-50).amount(), Decimal::new(-50, 2));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::new(Decimal::from(10)).to_string(), "$10.00");
        assert_eq!(Price::from_cents(1250).to_string(), "$12.50");
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::from_cents(1250);
        assert_eq!(price.times(qty(3)), Price::from_cents(3750));
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::from_cents(100), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(350));
    }

    #[test]
    fn test_high_precision_price_survives_json() {
        let price = Price::new(Decimal::from_str("19.123456789012345678").unwrap());
        assert_ne!(price.amount(), Decimal::from_str("19.123456789012345678").unwrap());

        let json = serde_json::to_string(&price).unwrap();
        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
    }

    #[test]
    fn test_normalize_is_stable() {
        for raw in ["0.1", "19.99", "4.5", "12345.67", "0.3333333333333333333333", "99999999999.999999"] {
            let once = Price::new(Decimal::from_str(raw).unwrap());
            assert_eq!(Price::new(once.amount()), once, "{raw}");

            let parsed: Price = serde_json::from_str(&serde_json::to_string(&once).unwrap()).unwrap();
            assert_eq!(parsed, once, "{raw}");
        }
    }

    #[test]
    fn test_short_prices_are_unchanged() {
        assert_eq!(Price::new(Decimal::from_str("19.99").unwrap()).amount(), Decimal::new(1999, 2));
        assert_eq!(Price::from_cents(10).amount(), Decimal::new(1, 1));
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_string(&Price::from_cents(1250)).unwrap();
        assert_eq!(json, "12.5");

        let parsed: Price = serde_json::from_str("10").unwrap();
        assert_eq!(parsed, Price::new(Decimal::from(10)));
    }
}
