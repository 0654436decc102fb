//! Money arithmetic on `rust_decimal`.
//!
//! Everything inside the engine stays unrounded; rounding to two places happens only
//! when a value leaves for display (`present`), so many small addon lines do not
//! accumulate rounding drift.

use rust_decimal::prelude::*;

pub type Money = Decimal;

const DECIMAL_PLACES: u32 = 2;

/// Round for display: two places, half away from zero
pub fn present(value: Money) -> Money {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a configured float (e.g. a VAT rate) into money, rejecting NaN/infinity
pub fn from_f64(value: f64) -> Option<Money> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Multiply a unit price by an item count
pub fn times(unit: Money, quantity: u32) -> Money {
    unit * Decimal::from(quantity)
}
