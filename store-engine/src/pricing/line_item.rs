//! Line item pricer
//!
//! Fixed order of operations, validated inputs, one rounding per derived
//! field:
//!
//! 1. subtotal = quantity * unit_price
//! 2. discount_amount = subtotal * discount_percentage / 100
//! 3. taxable_amount = subtotal - discount_amount
//! 4. tax_amount = taxable_amount * tax_rate / 100
//! 5. total = taxable_amount + tax_amount

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::StoreResult;
use shared::models::InvoiceLineItem;
use shared::money::{percent_of, require_line_quantity, require_money, require_percentage, round_money};

/// Result of pricing a single line, intermediates included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemPricing {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Price one line
///
/// Inputs are validated before any arithmetic runs; a negative quantity or
/// unit price, or an out-of-range percentage, is an `InvalidInput` failure
/// and the computation never starts.
pub fn price_line_item(
    quantity: Decimal,
    unit_price: Decimal,
    discount_percentage: Decimal,
    tax_rate: Decimal,
) -> StoreResult<LineItemPricing> {
    require_line_quantity(quantity, "quantity")?;
    require_money(unit_price, "unit_price")?;
    require_percentage(discount_percentage, "discount_percentage")?;
    require_percentage(tax_rate, "tax_rate")?;

    let subtotal = round_money(quantity * unit_price);
    let discount_amount = round_money(percent_of(subtotal, discount_percentage));
    let taxable_amount = subtotal - discount_amount;
    let tax_amount = round_money(percent_of(taxable_amount, tax_rate));
    let total = taxable_amount + tax_amount;

    Ok(LineItemPricing {
        subtotal,
        discount_amount,
        taxable_amount,
        tax_amount,
        total,
    })
}

/// Recompute an invoice line's derived fields from its inputs
///
/// The only writer of `subtotal` / `discount_amount` / `tax_amount` /
/// `total` on a line - derived fields change together or not at all.
pub fn apply_line_pricing(item: &mut InvoiceLineItem) -> StoreResult<()> {
    let pricing = price_line_item(
        item.quantity,
        item.unit_price,
        item.discount_percentage,
        item.tax_rate,
    )?;
    item.subtotal = pricing.subtotal;
    item.discount_amount = pricing.discount_amount;
    item.tax_amount = pricing.tax_amount;
    item.total = pricing.total;
    Ok(())
}
