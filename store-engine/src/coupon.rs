//! Coupon evaluation and redemption
//!
//! Validation is a pure read; redemption validates and increments the
//! usage count under the store's write lock, so a coupon can never be
//! redeemed past its usage limit by concurrent checkouts.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::error::{StoreError, StoreResult};
use shared::models::coupon::normalize_code;
use shared::models::{Coupon, CouponDiscount, DiscountType};
use shared::money::{percent_of, require_money, round_money};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory coupon store and evaluator
#[derive(Clone, Default)]
pub struct CouponService {
    coupons: Arc<RwLock<HashMap<String, Coupon>>>,
}

impl std::fmt::Debug for CouponService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouponService")
            .field("coupons", &self.coupons.read().len())
            .finish()
    }
}

impl CouponService {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Operator surface ==========

    /// Register a new coupon; codes are unique case-insensitively
    pub fn insert(&self, mut coupon: Coupon) -> StoreResult<()> {
        coupon.code = normalize_code(&coupon.code);
        let mut coupons = self.coupons.write();
        if coupons.contains_key(&coupon.code) {
            return Err(StoreError::duplicate(coupon.code));
        }
        tracing::info!(code = %coupon.code, "Coupon registered");
        coupons.insert(coupon.code.clone(), coupon);
        Ok(())
    }

    pub fn deactivate(&self, code: &str) -> StoreResult<()> {
        let code = normalize_code(code);
        let mut coupons = self.coupons.write();
        let coupon = coupons
            .get_mut(&code)
            .ok_or(StoreError::CouponNotFound)?;
        coupon.is_active = false;
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<Coupon> {
        self.coupons.read().get(&normalize_code(code)).cloned()
    }

    /// Currently valid coupons, best discount first
    pub fn list_active(&self, now: DateTime<Utc>) -> Vec<Coupon> {
        let mut active: Vec<Coupon> = self
            .coupons
            .read()
            .values()
            .filter(|c| c.is_valid(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.discount_value.cmp(&a.discount_value));
        active
    }

    // ========== Evaluation ==========

    /// Validate a code against an order amount without consuming a use
    pub fn validate(
        &self,
        code: &str,
        order_amount: Decimal,
        now: DateTime<Utc>,
    ) -> StoreResult<CouponDiscount> {
        require_money(order_amount, "order_amount")?;
        let coupons = self.coupons.read();
        let coupon = coupons
            .get(&normalize_code(code))
            .ok_or(StoreError::CouponNotFound)?;
        evaluate(coupon, order_amount, now)
    }

    /// Validate and consume one use, atomically
    ///
    /// The check and the increment run under the same write lock, so two
    /// checkouts racing for a coupon's last use cannot both win.
    pub fn redeem(
        &self,
        code: &str,
        order_amount: Decimal,
        now: DateTime<Utc>,
    ) -> StoreResult<CouponDiscount> {
        require_money(order_amount, "order_amount")?;
        let mut coupons = self.coupons.write();
        let coupon = coupons
            .get_mut(&normalize_code(code))
            .ok_or(StoreError::CouponNotFound)?;
        let discount = evaluate(coupon, order_amount, now)?;
        coupon.used_count += 1;
        tracing::info!(
            code = %coupon.code,
            used_count = coupon.used_count,
            discount = %discount.discount_amount,
            "Coupon redeemed"
        );
        Ok(discount)
    }

    /// Give back a use consumed by [`redeem`](Self::redeem)
    ///
    /// Compensation for a checkout that failed after redemption.
    pub fn release(&self, code: &str) {
        let mut coupons = self.coupons.write();
        match coupons.get_mut(&normalize_code(code)) {
            Some(coupon) => {
                coupon.used_count = coupon.used_count.saturating_sub(1);
                tracing::info!(code = %coupon.code, "Coupon redemption released");
            }
            None => tracing::warn!(code, "Release for unknown coupon ignored"),
        }
    }
}

/// Evaluate a coupon against an order amount
///
/// A valid coupon that computes to a 0.00 discount is reported as
/// `MinimumOrderNotMet` - a no-op discount is never applied. The shortfall
/// is 0 for degenerate zero-value coupons.
fn evaluate(
    coupon: &Coupon,
    order_amount: Decimal,
    now: DateTime<Utc>,
) -> StoreResult<CouponDiscount> {
    if !coupon.is_valid(now) {
        return Err(StoreError::CouponExpired);
    }
    if order_amount < coupon.minimum_order_amount {
        return Err(StoreError::MinimumOrderNotMet {
            minimum: coupon.minimum_order_amount,
            shortfall: coupon.minimum_order_amount - order_amount,
        });
    }

    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            let discount = percent_of(order_amount, coupon.discount_value);
            match coupon.maximum_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        DiscountType::Fixed => coupon.discount_value,
    };
    // Never exceed the order total
    let discount_amount = round_money(raw.min(order_amount));

    if discount_amount.is_zero() {
        return Err(StoreError::MinimumOrderNotMet {
            minimum: coupon.minimum_order_amount,
            shortfall: (coupon.minimum_order_amount - order_amount).max(Decimal::ZERO),
        });
    }

    Ok(CouponDiscount {
        code: coupon.code.clone(),
        description: coupon.description.clone(),
        discount_amount,
    })
}
