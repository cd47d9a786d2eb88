//! Cents <-> dollars at the display and admin-form boundaries.
//!
//! Prices are compared and stored as integer cents; `Decimal` only appears
//! when a value is shown or typed in.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Exact two-place decimal for a cents amount. Negative input is clamped to zero.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents.max(0), 2)
}

/// `$12.50`
pub fn format_price(cents: i64) -> String {
    format!("${}", cents_to_decimal(cents))
}

/// Parses an admin-entered dollar amount into cents.
///
/// Accepts `12`, `12.5`, `$1,200.00`. Anything unparseable or negative
/// becomes `0`; fractions of a cent round half away from zero.
pub fn parse_price_to_cents(input: &str) -> i64 {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let Ok(dollars) = Decimal::from_str(cleaned.trim()) else {
        return 0;
    };
    if dollars.is_sign_negative() {
        return 0;
    }

    dollars
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|c| c.to_i64())
        .unwrap_or(0)
}
