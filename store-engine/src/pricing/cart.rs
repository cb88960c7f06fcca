//! Cart aggregator
//!
//! Pure read over the current cart lines: item count, amount, free
//! shipping eligibility. No discount or tax exists at cart level; that
//! belongs to the coupon evaluator and the order assembler.

use rust_decimal::Decimal;
use shared::models::{CartItem, CartTotals};

/// Aggregate cart lines into totals
///
/// `total_amount` sums `(base price + variant addon) * quantity` per line.
/// Computed fresh from the lines passed in - callers must hand over the
/// latest persisted state, and nothing here is cached.
pub fn aggregate_cart(items: &[CartItem], free_shipping_threshold: Decimal) -> CartTotals {
    let mut total_items: u32 = 0;
    let mut total_amount = Decimal::ZERO;

    for item in items {
        total_items += item.quantity;
        total_amount += item.line_total();
    }

    CartTotals {
        total_items,
        total_amount,
        free_shipping_eligible: total_amount >= free_shipping_threshold,
    }
}
