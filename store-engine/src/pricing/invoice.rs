//! Invoice totals calculator
//!
//! Aggregate level of the two-level discount + tax model: the invoice
//! subtotal is the sum of each line's pre-discount, pre-tax subtotal (not
//! the line totals - that would compound each line's discount twice), and
//! the invoice's own discount and tax are then applied once on top.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::StoreResult;
use shared::models::InvoiceLineItem;
use shared::money::{percent_of, require_percentage, round_money};

/// Result of recomputing an invoice's totals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Recompute invoice totals from its line items
///
/// An invoice with zero lines has all-zero totals. Line derived fields are
/// expected to be current (the billing service reprices lines before it
/// calls this).
pub fn recalculate_invoice(
    items: &[InvoiceLineItem],
    discount_percentage: Decimal,
    tax_rate: Decimal,
) -> StoreResult<InvoiceTotals> {
    require_percentage(discount_percentage, "discount_percentage")?;
    require_percentage(tax_rate, "tax_rate")?;

    let subtotal: Decimal = items.iter().map(|i| i.subtotal).sum();
    let discount_amount = round_money(percent_of(subtotal, discount_percentage));
    let taxable_amount = subtotal - discount_amount;
    let tax_amount = round_money(percent_of(taxable_amount, tax_rate));
    let total_amount = taxable_amount + tax_amount;

    Ok(InvoiceTotals {
        subtotal,
        discount_amount,
        taxable_amount,
        tax_amount,
        total_amount,
    })
}
