//! Coupon model
//!
//! A string-keyed discount rule with a validity window and an optional
//! usage cap. Codes are case-insensitive and stored uppercase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discount type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Normalize a coupon code for lookup: trimmed, uppercase
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Coupon entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coupon {
    /// Unique, case-insensitive; stored uppercase
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    /// Percentage (0-100) for percentage type, currency amount for fixed
    pub discount_value: Decimal,
    pub minimum_order_amount: Decimal,
    /// Cap on the computed discount; only meaningful for percentage type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_discount: Option<Decimal>,
    /// None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Active, inside the validity window, and not used up
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.valid_from <= now
            && now <= self.valid_to
            && self.usage_limit.is_none_or(|limit| self.used_count < limit)
    }

    /// Redemptions still available, None = unlimited
    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.used_count))
    }
}

/// A successfully evaluated discount, ready to apply to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponDiscount {
    pub code: String,
    pub description: String,
    pub discount_amount: Decimal,
}
