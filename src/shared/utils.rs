//! Utility functions and helpers

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept by every price, size and rate computation.
pub const SCALE: u32 = 10;

/// Round to `scale` fractional digits, ties away from zero.
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// `numerator / denominator` at [`SCALE`], half-up. `None` on a zero divisor or overflow.
pub fn divide(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator
        .checked_div(denominator)
        .map(|v| round_half_up(v, SCALE))
}

pub fn trim<V>(first: Option<V>, second: V) -> V {
    first.unwrap_or(second)
}

pub fn trim_to_zero(value: Option<Decimal>) -> Decimal {
    trim(value, Decimal::ZERO)
}

pub fn trim_to_empty<T>(values: Option<Vec<T>>) -> Vec<T> {
    values.unwrap_or_default()
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
