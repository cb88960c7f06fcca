//! Invoice model
//!
//! Two-level discount + tax: each line carries its own discount percentage
//! and tax rate, and the invoice applies its own discount and tax on the
//! aggregate of the lines' pre-discount subtotals. Derived fields are
//! always recomputed together by the billing service; they are never
//! edited directly.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an invoice was paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoicePaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    Cheque,
}

/// A payment recorded against an invoice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoicePayment {
    pub id: String,
    pub amount: Decimal,
    pub method: InvoicePaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

/// A line on an invoice
///
/// Inputs: description, quantity, unit price, discount percentage, tax
/// rate. Everything below `tax_rate` is derived and owned by the billing
/// service's recompute pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    pub id: String,
    pub description: String,
    /// Supports fractional units (e.g. 2.5 metres)
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
    pub tax_rate: Decimal,

    // === Derived ===
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Invoice entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    /// `<prefix><4-digit zero-padded sequence>`, unique per store
    pub invoice_number: String,
    pub customer_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    /// Invoice-level discount applied once on the aggregated subtotal
    pub discount_percentage: Decimal,
    pub tax_rate: Decimal,
    pub items: Vec<InvoiceLineItem>,

    // === Derived ===
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,

    pub amount_paid: Decimal,
    pub payments: Vec<InvoicePayment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn amount_due(&self) -> Decimal {
        (self.total_amount - self.amount_paid).max(Decimal::ZERO)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid >= self.total_amount
    }

    /// Line items may change until the invoice is settled or cancelled
    pub fn is_editable(&self) -> bool {
        !matches!(self.status, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    pub fn mark_sent(&mut self) -> StoreResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(StoreError::invalid_transition(
                "invoice",
                self.status,
                InvoiceStatus::Sent,
            ));
        }
        self.status = InvoiceStatus::Sent;
        self.touch();
        Ok(())
    }

    pub fn mark_overdue(&mut self) -> StoreResult<()> {
        if self.status != InvoiceStatus::Sent {
            return Err(StoreError::invalid_transition(
                "invoice",
                self.status,
                InvoiceStatus::Overdue,
            ));
        }
        self.status = InvoiceStatus::Overdue;
        self.touch();
        Ok(())
    }

    pub fn cancel(&mut self) -> StoreResult<()> {
        if matches!(self.status, InvoiceStatus::Paid | InvoiceStatus::Cancelled) {
            return Err(StoreError::invalid_transition(
                "invoice",
                self.status,
                InvoiceStatus::Cancelled,
            ));
        }
        self.status = InvoiceStatus::Cancelled;
        self.touch();
        Ok(())
    }

    /// Record a payment; flips to PAID once the total is covered
    ///
    /// Payments are only accepted on issued invoices (SENT or OVERDUE).
    pub fn apply_payment(&mut self, payment: InvoicePayment) -> StoreResult<()> {
        if payment.amount <= Decimal::ZERO {
            return Err(StoreError::invalid_input(format!(
                "payment amount must be positive, got {}",
                payment.amount
            )));
        }
        if !matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Overdue) {
            return Err(StoreError::invalid_transition(
                "invoice",
                self.status,
                InvoiceStatus::Paid,
            ));
        }
        self.amount_paid += payment.amount;
        self.payments.push(payment);
        if self.is_fully_paid() {
            self.status = InvoiceStatus::Paid;
        }
        self.touch();
        Ok(())
    }

    /// Past the due date and not settled or cancelled
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        !matches!(self.status, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
            && today > self.due_date
    }

    /// Bump `updated_at`; called by the billing service after mutations
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
