//! Pure price derivations over cart state.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};

use super::cart::{CartLine, CartStore};
use super::errors::StorefrontError;

/// `unit_price x quantity` for one line.
pub fn line_total(line: &CartLine) -> BigDecimal {
    &line.unit_price * BigDecimal::from(line.quantity)
}

/// Sum of the line totals. An empty cart totals zero.
pub fn grand_total(cart: &CartStore) -> BigDecimal {
    cart.lines()
        .iter()
        .map(line_total)
        .fold(BigDecimal::from(0), |acc, total| acc + total)
}

/// Converts a whole-currency amount to minor units (paise) for the payment
/// collaborator. Sub-paise fractions round half-up.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, StorefrontError> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| StorefrontError::InvalidAmount(amount.to_string()))
}
