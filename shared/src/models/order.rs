//! Order model
//!
//! An order is an immutable snapshot taken at checkout: address fields,
//! payment method and price totals are fixed at creation. Only status,
//! payment status, tracking fields and timestamps mutate afterwards, and
//! only through the guarded transition methods.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// PENDING -> CONFIRMED -> PROCESSING -> SHIPPED -> DELIVERED, with side
/// branches to CANCELLED or RETURNED from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        }
    }

    /// No further transitions allowed from these states
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status
///
/// PENDING -> COMPLETED | FAILED; COMPLETED -> REFUNDED.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
    Upi,
    NetBanking,
    Wallet,
}

/// Shipping/billing address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    pub full_name: String,
    pub phone: String,
    pub address_line_1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub pin_code: String,
}

impl Address {
    /// Reject an address with any required field missing
    ///
    /// Reports the first missing field so the caller can point at it.
    pub fn validate(&self) -> StoreResult<()> {
        let required: [(&'static str, &str); 6] = [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("address_line_1", &self.address_line_1),
            ("city", &self.city),
            ("state", &self.state),
            ("pin_code", &self.pin_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(StoreError::MissingAddress { field });
            }
        }
        Ok(())
    }
}

/// Product snapshot inside an order, fixed at the moment of placement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    /// Per-unit price at purchase time, variant addon included
    pub product_price: Decimal,
    /// Variant display label at purchase time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_info: Option<String>,
    pub quantity: u32,
    /// `product_price * quantity`, computed at placement
    pub line_total: Decimal,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique human-readable number, `ORD-<year>-<6 digits>`
    pub order_number: String,
    pub customer_id: String,
    pub shipping_address: Address,
    /// Defaults to the shipping address when not supplied
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    /// Code of the coupon redeemed against this order, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    // ========== Fulfilment state machine ==========

    pub fn confirm(&mut self) -> StoreResult<()> {
        self.transition_to(OrderStatus::Confirmed, OrderStatus::Pending)
    }

    pub fn begin_processing(&mut self) -> StoreResult<()> {
        self.transition_to(OrderStatus::Processing, OrderStatus::Confirmed)
    }

    pub fn ship(&mut self, tracking_number: impl Into<String>) -> StoreResult<()> {
        self.transition_to(OrderStatus::Shipped, OrderStatus::Processing)?;
        self.tracking_number = Some(tracking_number.into());
        self.shipped_at = Some(Utc::now());
        Ok(())
    }

    pub fn deliver(&mut self) -> StoreResult<()> {
        self.transition_to(OrderStatus::Delivered, OrderStatus::Shipped)?;
        self.delivered_at = Some(Utc::now());
        Ok(())
    }

    /// Allowed from any non-terminal state
    pub fn cancel(&mut self) -> StoreResult<()> {
        self.branch_to(OrderStatus::Cancelled)
    }

    /// Allowed from any non-terminal state
    pub fn mark_returned(&mut self) -> StoreResult<()> {
        self.branch_to(OrderStatus::Returned)
    }

    fn transition_to(&mut self, next: OrderStatus, expected: OrderStatus) -> StoreResult<()> {
        if self.status != expected {
            return Err(StoreError::invalid_transition("order", self.status, next));
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    fn branch_to(&mut self, next: OrderStatus) -> StoreResult<()> {
        if self.status.is_terminal() {
            return Err(StoreError::invalid_transition("order", self.status, next));
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    // ========== Payment state machine ==========

    pub fn complete_payment(&mut self) -> StoreResult<()> {
        self.payment_transition(PaymentStatus::Completed, PaymentStatus::Pending)
    }

    pub fn fail_payment(&mut self) -> StoreResult<()> {
        self.payment_transition(PaymentStatus::Failed, PaymentStatus::Pending)
    }

    pub fn refund_payment(&mut self) -> StoreResult<()> {
        self.payment_transition(PaymentStatus::Refunded, PaymentStatus::Completed)
    }

    fn payment_transition(
        &mut self,
        next: PaymentStatus,
        expected: PaymentStatus,
    ) -> StoreResult<()> {
        if self.payment_status != expected {
            return Err(StoreError::invalid_transition(
                "payment",
                self.payment_status,
                next,
            ));
        }
        self.payment_status = next;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            full_name: "Asha Verma".into(),
            phone: "+91-9876543210".into(),
            address_line_1: "12 Victoria Street".into(),
            address_line_2: None,
            city: "Lucknow".into(),
            state: "Uttar Pradesh".into(),
            pin_code: "226003".into(),
        }
    }

    fn order() -> Order {
        let now = Utc::now();
        Order {
            order_number: "ORD-2026-481516".into(),
            customer_id: "c1".into(),
            shipping_address: address(),
            billing_address: address(),
            payment_method: PaymentMethod::Upi,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            items: vec![],
            subtotal: Decimal::new(149900, 2),
            discount_amount: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total_amount: Decimal::new(149900, 2),
            coupon_code: None,
            tracking_number: None,
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_address_reports_first_missing_field() {
        let mut a = address();
        a.city = "  ".into();
        assert_eq!(
            a.validate(),
            Err(StoreError::MissingAddress { field: "city" })
        );
        assert!(address().validate().is_ok());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut o = order();
        o.confirm().unwrap();
        o.begin_processing().unwrap();
        o.ship("AWB123456").unwrap();
        assert!(o.shipped_at.is_some());
        o.deliver().unwrap();
        assert_eq!(o.status, OrderStatus::Delivered);
        assert!(o.delivered_at.is_some());
    }

    #[test]
    fn test_no_skipping_states() {
        let mut o = order();
        assert!(o.ship("AWB1").is_err());
        assert!(o.deliver().is_err());
        o.confirm().unwrap();
        assert!(o.confirm().is_err()); // no double confirm
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        let mut o = order();
        o.confirm().unwrap();
        o.begin_processing().unwrap();
        o.cancel().unwrap();
        assert_eq!(o.status, OrderStatus::Cancelled);

        // Terminal: nothing moves out of cancelled
        assert!(o.mark_returned().is_err());
        assert!(o.confirm().is_err());
    }

    #[test]
    fn test_returned_after_delivery_is_rejected_only_past_terminal() {
        let mut o = order();
        o.confirm().unwrap();
        o.begin_processing().unwrap();
        o.ship("AWB1").unwrap();
        o.mark_returned().unwrap(); // shipped is non-terminal
        assert_eq!(o.status, OrderStatus::Returned);
    }

    #[test]
    fn test_payment_machine() {
        let mut o = order();
        assert!(o.refund_payment().is_err()); // nothing to refund yet
        o.complete_payment().unwrap();
        assert!(o.fail_payment().is_err()); // already completed
        o.refund_payment().unwrap();
        assert_eq!(o.payment_status, PaymentStatus::Refunded);
    }
}
