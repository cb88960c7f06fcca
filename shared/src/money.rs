//! Money arithmetic helpers using rust_decimal for precision
//!
//! All monetary values in the engine are `Decimal` with 2 fractional
//! digits. Rounding happens once per derived field, with the half-up
//! strategy, so repeated recomputation can never drift.

use crate::error::{StoreError, StoreResult};
use rust_decimal::prelude::*;

/// Rounding precision for monetary values (2 decimal places, half-up)
pub const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price (1,000,000.00)
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9_999;

/// One hundred, the percentage divisor
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to 2 decimal places, midpoint away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `base * percentage / 100`, unrounded
///
/// Callers round once when the derived field is stored.
#[inline]
pub fn percent_of(base: Decimal, percentage: Decimal) -> Decimal {
    base * percentage / HUNDRED
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

/// Validate a monetary amount: non-negative and within range
pub fn require_money(value: Decimal, field: &str) -> StoreResult<()> {
    if value < Decimal::ZERO {
        return Err(StoreError::invalid_input(format!(
            "{} must be non-negative, got {}",
            field, value
        )));
    }
    if value > MAX_UNIT_PRICE {
        return Err(StoreError::invalid_input(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field, MAX_UNIT_PRICE, value
        )));
    }
    Ok(())
}

/// Validate a percentage: must be in [0, 100]
pub fn require_percentage(value: Decimal, field: &str) -> StoreResult<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(StoreError::invalid_input(format!(
            "{} must be between 0 and 100, got {}",
            field, value
        )));
    }
    Ok(())
}

/// Validate a cart/order quantity: positive and within bounds
pub fn require_quantity(quantity: u32, field: &str) -> StoreResult<()> {
    if quantity == 0 {
        return Err(StoreError::invalid_input(format!(
            "{} must be positive, got 0",
            field
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(StoreError::invalid_input(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field, MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Validate an invoice line quantity: positive decimal, within bounds
///
/// Invoice lines support fractional units (e.g. 2.5 metres of fabric).
pub fn require_line_quantity(quantity: Decimal, field: &str) -> StoreResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(StoreError::invalid_input(format!(
            "{} must be positive, got {}",
            field, quantity
        )));
    }
    if quantity > Decimal::from(MAX_QUANTITY) {
        return Err(StoreError::invalid_input(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field, MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}
