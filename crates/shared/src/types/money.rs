//! Conversions between rupee amounts and stored minor units (paise).
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts travel as `rust_decimal::Decimal` and are stored as whole paise in
//! a signed 64-bit integer, so no storage backend ever rounds through `f64`.

use rust_decimal::Decimal;

/// Number of decimal places in one minor unit (1 rupee = 100 paise).
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Returns true if `amount` carries precision finer than one paisa.
///
/// Trailing zeros do not count: `10.500` is representable, `10.005` is not.
#[must_use]
pub fn has_sub_minor_precision(amount: Decimal) -> bool {
    amount.normalize().scale() > MINOR_UNIT_SCALE
}

/// Converts a rupee amount to whole paise.
///
/// Returns `None` when the amount has sub-paisa precision or does not fit in `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if has_sub_minor_precision(amount) {
        return None;
    }
    let mut scaled = amount;
    scaled.rescale(MINOR_UNIT_SCALE);
    i64::try_from(scaled.mantissa()).ok()
}

/// Converts whole paise back to a rupee amount with two decimal places.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}
