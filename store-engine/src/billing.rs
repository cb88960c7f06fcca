//! Billing - invoice service
//!
//! Owns invoice numbering, line mutation and the recompute discipline:
//! every mutation reprices the affected lines and the invoice totals
//! before it returns, so derived fields are never stale. Number
//! assignment and insertion happen inside one write-lock critical
//! section, which makes concurrent creation collision-free.

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{StoreError, StoreResult};
use shared::models::{Invoice, InvoiceLineItem, InvoicePayment, InvoicePaymentMethod, InvoiceStatus};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::pricing::{apply_line_pricing, recalculate_invoice};

/// Input for one invoice line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
    /// None uses the store's default tax rate
    pub tax_rate: Option<Decimal>,
}

/// Input for creating an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Invoice-level discount on the aggregated subtotal
    pub discount_percentage: Decimal,
    /// None uses the store's default tax rate
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub items: Vec<LineItemInput>,
}

struct BillingState {
    invoices: HashMap<String, Invoice>,
}

/// In-memory invoice store
#[derive(Clone)]
pub struct InvoiceService {
    config: Arc<StoreConfig>,
    state: Arc<RwLock<BillingState>>,
}

impl std::fmt::Debug for InvoiceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceService")
            .field("invoices", &self.state.read().invoices.len())
            .finish()
    }
}

impl InvoiceService {
    pub fn new(config: Arc<StoreConfig>) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(BillingState {
                invoices: HashMap::new(),
            })),
        }
    }

    /// Create an invoice, assigning the next sequential number
    ///
    /// The sequence is 1 + the highest numeric suffix among invoices
    /// sharing the prefix (1 when there are none). Scan, assignment and
    /// insertion run under one write lock, so concurrent creations get
    /// distinct numbers.
    pub fn create_invoice(&self, draft: InvoiceDraft) -> StoreResult<Invoice> {
        let tax_rate = draft.tax_rate.unwrap_or(self.config.default_tax_rate);
        let mut items = Vec::with_capacity(draft.items.len());
        for input in draft.items {
            items.push(self.make_line(input)?);
        }
        let totals = recalculate_invoice(&items, draft.discount_percentage, tax_rate)?;

        let mut state = self.state.write();
        let invoice_number = next_invoice_number(&state.invoices, &self.config.invoice_prefix);
        if state.invoices.contains_key(&invoice_number) {
            return Err(StoreError::duplicate(invoice_number));
        }

        let now = Utc::now();
        let invoice = Invoice {
            invoice_number: invoice_number.clone(),
            customer_name: draft.customer_name,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            status: InvoiceStatus::Draft,
            discount_percentage: draft.discount_percentage,
            tax_rate,
            items,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            amount_paid: Decimal::ZERO,
            payments: Vec::new(),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        state.invoices.insert(invoice_number.clone(), invoice.clone());
        tracing::info!(%invoice_number, total = %invoice.total_amount, "Invoice created");
        Ok(invoice)
    }

    // ========== Line mutation (always reprices) ==========

    pub fn add_line_item(&self, invoice_number: &str, input: LineItemInput) -> StoreResult<Invoice> {
        let line = self.make_line(input)?;
        self.with_editable(invoice_number, |invoice| {
            invoice.items.push(line);
            Ok(())
        })
    }

    pub fn update_line_item(
        &self,
        invoice_number: &str,
        line_id: &str,
        input: LineItemInput,
    ) -> StoreResult<Invoice> {
        let tax_rate = input.tax_rate.unwrap_or(self.config.default_tax_rate);
        self.with_editable(invoice_number, |invoice| {
            let line = invoice
                .items
                .iter_mut()
                .find(|l| l.id == line_id)
                .ok_or_else(|| StoreError::not_found(format!("line item {}", line_id)))?;
            line.description = input.description;
            line.quantity = input.quantity;
            line.unit_price = input.unit_price;
            line.discount_percentage = input.discount_percentage;
            line.tax_rate = tax_rate;
            apply_line_pricing(line)
        })
    }

    pub fn remove_line_item(&self, invoice_number: &str, line_id: &str) -> StoreResult<Invoice> {
        self.with_editable(invoice_number, |invoice| {
            let before = invoice.items.len();
            invoice.items.retain(|l| l.id != line_id);
            if invoice.items.len() == before {
                return Err(StoreError::not_found(format!("line item {}", line_id)));
            }
            Ok(())
        })
    }

    pub fn set_discount_percentage(
        &self,
        invoice_number: &str,
        discount_percentage: Decimal,
    ) -> StoreResult<Invoice> {
        self.with_editable(invoice_number, |invoice| {
            invoice.discount_percentage = discount_percentage;
            Ok(())
        })
    }

    pub fn set_tax_rate(&self, invoice_number: &str, tax_rate: Decimal) -> StoreResult<Invoice> {
        self.with_editable(invoice_number, |invoice| {
            invoice.tax_rate = tax_rate;
            Ok(())
        })
    }

    // ========== Lifecycle ==========

    pub fn mark_sent(&self, invoice_number: &str) -> StoreResult<Invoice> {
        self.with_invoice(invoice_number, |invoice| invoice.mark_sent())
    }

    pub fn cancel(&self, invoice_number: &str) -> StoreResult<Invoice> {
        self.with_invoice(invoice_number, |invoice| invoice.cancel())
    }

    pub fn record_payment(
        &self,
        invoice_number: &str,
        amount: Decimal,
        method: InvoicePaymentMethod,
        reference: Option<String>,
    ) -> StoreResult<Invoice> {
        let updated = self.with_invoice(invoice_number, |invoice| {
            invoice.apply_payment(InvoicePayment {
                id: Uuid::new_v4().to_string(),
                amount,
                method,
                reference,
                paid_at: Utc::now(),
            })
        })?;
        tracing::info!(
            invoice_number,
            amount = %amount,
            status = %updated.status,
            "Payment recorded"
        );
        Ok(updated)
    }

    /// Flip every SENT invoice past its due date to OVERDUE
    ///
    /// Returns the numbers that changed.
    pub fn refresh_overdue(&self, today: NaiveDate) -> Vec<String> {
        let mut state = self.state.write();
        let mut flipped = Vec::new();
        for (number, invoice) in state.invoices.iter_mut() {
            if invoice.status == InvoiceStatus::Sent && invoice.is_past_due(today) {
                invoice.status = InvoiceStatus::Overdue;
                invoice.touch();
                flipped.push(number.clone());
            }
        }
        if !flipped.is_empty() {
            tracing::info!(count = flipped.len(), "Invoices marked overdue");
        }
        flipped
    }

    // ========== Lookup ==========

    pub fn get(&self, invoice_number: &str) -> StoreResult<Invoice> {
        self.state
            .read()
            .invoices
            .get(invoice_number)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("invoice {}", invoice_number)))
    }

    /// All invoices, newest first
    pub fn list(&self) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self.state.read().invoices.values().cloned().collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        invoices
    }

    // ========== Internals ==========

    fn make_line(&self, input: LineItemInput) -> StoreResult<InvoiceLineItem> {
        let mut line = InvoiceLineItem {
            id: Uuid::new_v4().to_string(),
            description: input.description,
            quantity: input.quantity,
            unit_price: input.unit_price,
            discount_percentage: input.discount_percentage,
            tax_rate: input.tax_rate.unwrap_or(self.config.default_tax_rate),
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        };
        apply_line_pricing(&mut line)?;
        Ok(line)
    }

    /// Run a mutation on an editable invoice, then recompute its totals
    fn with_editable(
        &self,
        invoice_number: &str,
        f: impl FnOnce(&mut Invoice) -> StoreResult<()>,
    ) -> StoreResult<Invoice> {
        self.with_invoice(invoice_number, |invoice| {
            if !invoice.is_editable() {
                return Err(StoreError::invalid_input(format!(
                    "invoice {} is not editable in status {}",
                    invoice.invoice_number, invoice.status
                )));
            }
            f(invoice)?;
            let totals =
                recalculate_invoice(&invoice.items, invoice.discount_percentage, invoice.tax_rate)?;
            invoice.subtotal = totals.subtotal;
            invoice.discount_amount = totals.discount_amount;
            invoice.tax_amount = totals.tax_amount;
            invoice.total_amount = totals.total_amount;
            Ok(())
        })
    }

    fn with_invoice(
        &self,
        invoice_number: &str,
        f: impl FnOnce(&mut Invoice) -> StoreResult<()>,
    ) -> StoreResult<Invoice> {
        let mut state = self.state.write();
        let invoice = state
            .invoices
            .get_mut(invoice_number)
            .ok_or_else(|| StoreError::not_found(format!("invoice {}", invoice_number)))?;
        f(invoice)?;
        invoice.touch();
        Ok(invoice.clone())
    }
}

/// Next number for the prefix: `<prefix><4-digit zero-padded sequence>`
///
/// Sequence continues from the highest numeric suffix already present.
/// Grows past 4 digits rather than wrapping once 9999 is exceeded.
fn next_invoice_number(invoices: &HashMap<String, Invoice>, prefix: &str) -> String {
    let highest = invoices
        .keys()
        .filter_map(|number| number.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:04}", prefix, highest + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn service() -> InvoiceService {
        InvoiceService::new(Arc::new(StoreConfig::default()))
    }

    fn line(desc: &str, qty: &str, price: &str) -> LineItemInput {
        LineItemInput {
            description: desc.into(),
            quantity: dec(qty),
            unit_price: dec(price),
            discount_percentage: Decimal::ZERO,
            tax_rate: None,
        }
    }

    fn draft(items: Vec<LineItemInput>) -> InvoiceDraft {
        InvoiceDraft {
            customer_name: "Meera Traders".into(),
            issue_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            discount_percentage: Decimal::ZERO,
            tax_rate: None,
            notes: None,
            items,
        }
    }

    #[test]
    fn test_sequential_numbering() {
        let service = service();
        let a = service.create_invoice(draft(vec![])).unwrap();
        let b = service.create_invoice(draft(vec![])).unwrap();
        let c = service.create_invoice(draft(vec![])).unwrap();
        assert_eq!(a.invoice_number, "INV0001");
        assert_eq!(b.invoice_number, "INV0002");
        assert_eq!(c.invoice_number, "INV0003");
    }

    #[test]
    fn test_empty_invoice_has_zero_totals() {
        let service = service();
        let invoice = service.create_invoice(draft(vec![])).unwrap();
        assert_eq!(invoice.subtotal, Decimal::ZERO);
        assert_eq!(invoice.discount_amount, Decimal::ZERO);
        assert_eq!(invoice.tax_amount, Decimal::ZERO);
        assert_eq!(invoice.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_create_applies_two_level_model() {
        let service = service();
        let mut d = draft(vec![
            line("Banarasi dupatta", "2", "1000.00"),
            line("Chiffon dupatta", "1", "500.00"),
        ]);
        d.discount_percentage = dec("10");
        let invoice = service.create_invoice(d).unwrap();

        // Lines taxed at the default 18% individually...
        assert_eq!(invoice.items[0].total, dec("2360.00"));
        // ...but the invoice aggregates pre-tax subtotals
        assert_eq!(invoice.subtotal, dec("2500.00"));
        assert_eq!(invoice.discount_amount, dec("250.00"));
        assert_eq!(invoice.tax_amount, dec("405.00")); // 18% of 2250
        assert_eq!(invoice.total_amount, dec("2655.00"));
    }

    #[test]
    fn test_line_mutations_recompute_totals() {
        let service = service();
        let invoice = service
            .create_invoice(draft(vec![line("Dupatta", "1", "1000.00")]))
            .unwrap();
        let number = invoice.invoice_number.clone();
        assert_eq!(invoice.total_amount, dec("1180.00"));

        let invoice = service
            .add_line_item(&number, line("Kurti", "2", "600.00"))
            .unwrap();
        assert_eq!(invoice.subtotal, dec("2200.00"));
        assert_eq!(invoice.total_amount, dec("2596.00"));

        let line_id = invoice.items[1].id.clone();
        let invoice = service
            .update_line_item(&number, &line_id, line("Kurti", "1", "600.00"))
            .unwrap();
        assert_eq!(invoice.subtotal, dec("1600.00"));

        let invoice = service.remove_line_item(&number, &line_id).unwrap();
        assert_eq!(invoice.subtotal, dec("1000.00"));
        assert_eq!(invoice.total_amount, dec("1180.00"));

        assert!(matches!(
            service.remove_line_item(&number, "ghost"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_invoice_discount_and_tax_edits_recompute() {
        let service = service();
        let invoice = service
            .create_invoice(draft(vec![line("Dupatta", "1", "1000.00")]))
            .unwrap();
        let number = invoice.invoice_number.clone();

        let invoice = service.set_discount_percentage(&number, dec("25")).unwrap();
        assert_eq!(invoice.discount_amount, dec("250.00"));
        assert_eq!(invoice.total_amount, dec("885.00")); // (1000-250)*1.18

        let invoice = service.set_tax_rate(&number, dec("5")).unwrap();
        assert_eq!(invoice.tax_amount, dec("37.50"));
        assert_eq!(invoice.total_amount, dec("787.50"));
    }

    #[test]
    fn test_settled_invoice_rejects_edits() {
        let service = service();
        let invoice = service
            .create_invoice(draft(vec![line("Dupatta", "1", "1000.00")]))
            .unwrap();
        let number = invoice.invoice_number.clone();
        service.mark_sent(&number).unwrap();
        service
            .record_payment(&number, dec("1180.00"), InvoicePaymentMethod::Upi, None)
            .unwrap();

        let err = service
            .add_line_item(&number, line("Late addition", "1", "100.00"))
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");
        assert_eq!(service.get(&number).unwrap().status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let service = service();
        let invoice = service
            .create_invoice(draft(vec![line("Dupatta", "1", "1000.00")]))
            .unwrap();
        let number = invoice.invoice_number.clone();
        service.mark_sent(&number).unwrap();

        let invoice = service
            .record_payment(&number, dec("500.00"), InvoicePaymentMethod::Cash, None)
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.amount_due(), dec("680.00"));

        let invoice = service
            .record_payment(
                &number,
                dec("680.00"),
                InvoicePaymentMethod::BankTransfer,
                Some("NEFT-1234".into()),
            )
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.payments.len(), 2);
    }

    #[test]
    fn test_refresh_overdue_only_flips_sent() {
        let service = service();
        let sent = service
            .create_invoice(draft(vec![line("Dupatta", "1", "1000.00")]))
            .unwrap();
        service.mark_sent(&sent.invoice_number).unwrap();
        let still_draft = service.create_invoice(draft(vec![])).unwrap();

        let flipped = service.refresh_overdue(NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
        assert_eq!(flipped, vec![sent.invoice_number.clone()]);
        assert_eq!(
            service.get(&sent.invoice_number).unwrap().status,
            InvoiceStatus::Overdue
        );
        assert_eq!(
            service.get(&still_draft.invoice_number).unwrap().status,
            InvoiceStatus::Draft
        );

        // Second sweep is a no-op
        assert!(service
            .refresh_overdue(NaiveDate::from_ymd_opt(2026, 8, 8).unwrap())
            .is_empty());
    }

    #[test]
    fn test_invalid_line_input_rejected() {
        let service = service();
        let mut bad = line("Negative", "1", "100.00");
        bad.unit_price = dec("-1.00");
        assert!(service.create_invoice(draft(vec![bad])).is_err());

        let mut bad = line("Zero qty", "0", "100.00");
        bad.quantity = Decimal::ZERO;
        assert!(service.create_invoice(draft(vec![bad])).is_err());
    }
}
