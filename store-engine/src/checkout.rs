//! Checkout - order assembly
//!
//! Snapshots cart, address and coupon state into an immutable order.
//! Failure anywhere leaves no durable change: the cart is restored and a
//! redeemed coupon released. Success destroys the cart, consumes one
//! coupon use and stores the order under a unique number.

use chrono::{Datelike, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use rust_decimal::Decimal;
use shared::error::{StoreError, StoreResult};
use shared::models::{
    Address, CartOwner, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
};
use std::sync::Arc;

use crate::cart::CartService;
use crate::config::StoreConfig;
use crate::coupon::CouponService;
use crate::pricing::aggregate_cart;

/// Order assembly and lookup
#[derive(Clone)]
pub struct CheckoutService {
    config: Arc<StoreConfig>,
    carts: CartService,
    coupons: CouponService,
    orders: Arc<DashMap<String, Order>>,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("orders", &self.orders.len())
            .finish()
    }
}

impl CheckoutService {
    pub fn new(config: Arc<StoreConfig>, carts: CartService, coupons: CouponService) -> Self {
        Self {
            config,
            carts,
            coupons,
            orders: Arc::new(DashMap::new()),
        }
    }

    /// Place an order from the owner's cart
    ///
    /// Preconditions: an authenticated customer, a fully populated
    /// shipping address, a non-empty cart. The coupon, when given, is
    /// redeemed exactly once as the final fallible step; any later failure
    /// path releases it again.
    pub fn place_order(
        &self,
        owner: &CartOwner,
        shipping_address: Address,
        billing_address: Option<Address>,
        payment_method: PaymentMethod,
        coupon_code: Option<&str>,
    ) -> StoreResult<Order> {
        let customer_id = owner
            .customer_id()
            .ok_or_else(|| StoreError::invalid_input("checkout requires an authenticated customer"))?
            .to_string();
        shipping_address.validate()?;
        let billing_address = match billing_address {
            Some(address) => {
                address.validate()?;
                address
            }
            None => shipping_address.clone(),
        };

        // From here on the cart is out of the store; every early return
        // below must restore it.
        let cart = self.carts.take_for_checkout(owner)?;

        let totals = aggregate_cart(&cart.items, self.config.free_shipping_threshold);
        let shipping_cost = if totals.free_shipping_eligible {
            Decimal::ZERO
        } else {
            self.config.express_shipping_cost
        };

        // Redeem last among the fallible checks, so a consumed use can
        // only be left behind by the insert loop, which compensates.
        let coupon = match coupon_code {
            Some(code) => match self.coupons.redeem(code, totals.total_amount, Utc::now()) {
                Ok(discount) => Some(discount),
                Err(err) => {
                    self.carts.restore(cart);
                    return Err(err);
                }
            },
            None => None,
        };
        let discount_amount = coupon
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or(Decimal::ZERO);
        let total_amount = order_total(totals.total_amount, discount_amount, shipping_cost);

        let items: Vec<OrderItem> = cart.items.iter().map(snapshot_line).collect();
        let now = Utc::now();

        for _ in 0..self.config.order_number_retry_limit {
            let order_number = generate_order_number();
            match self.orders.entry(order_number.clone()) {
                Entry::Occupied(_) => {
                    tracing::warn!(%order_number, "Order number collision, retrying");
                }
                Entry::Vacant(slot) => {
                    let order = Order {
                        order_number: order_number.clone(),
                        customer_id,
                        shipping_address,
                        billing_address,
                        payment_method,
                        status: OrderStatus::Pending,
                        payment_status: PaymentStatus::Pending,
                        items,
                        subtotal: totals.total_amount,
                        discount_amount,
                        shipping_cost,
                        total_amount,
                        coupon_code: coupon.as_ref().map(|c| c.code.clone()),
                        tracking_number: None,
                        shipped_at: None,
                        delivered_at: None,
                        created_at: now,
                        updated_at: now,
                    };
                    slot.insert(order.clone());
                    tracing::info!(
                        %order_number,
                        total = %order.total_amount,
                        items = order.items.len(),
                        "Order placed"
                    );
                    return Ok(order);
                }
            }
        }

        // Could not reserve a number: undo the redemption, put the cart back
        if let Some(c) = &coupon {
            self.coupons.release(&c.code);
        }
        self.carts.restore(cart);
        Err(StoreError::ConcurrencyConflict {
            retries: self.config.order_number_retry_limit,
        })
    }

    pub fn get(&self, order_number: &str) -> StoreResult<Order> {
        self.orders
            .get(order_number)
            .map(|o| o.value().clone())
            .ok_or_else(|| StoreError::not_found(format!("order {}", order_number)))
    }

    /// A customer's orders, newest first
    pub fn orders_for_customer(&self, customer_id: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .map(|o| o.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    // ========== Administrative transitions ==========

    pub fn confirm(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.confirm())
    }

    pub fn begin_processing(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.begin_processing())
    }

    pub fn ship(&self, order_number: &str, tracking_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.ship(tracking_number))
    }

    pub fn deliver(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.deliver())
    }

    pub fn cancel(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.cancel())
    }

    pub fn mark_returned(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.mark_returned())
    }

    pub fn complete_payment(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.complete_payment())
    }

    pub fn fail_payment(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.fail_payment())
    }

    pub fn refund_payment(&self, order_number: &str) -> StoreResult<Order> {
        self.with_order(order_number, |o| o.refund_payment())
    }

    fn with_order(
        &self,
        order_number: &str,
        f: impl FnOnce(&mut Order) -> StoreResult<()>,
    ) -> StoreResult<Order> {
        let mut order = self
            .orders
            .get_mut(order_number)
            .ok_or_else(|| StoreError::not_found(format!("order {}", order_number)))?;
        f(order.value_mut())?;
        Ok(order.value().clone())
    }
}

/// `subtotal - discount + shipping`, clamped at zero
///
/// The coupon evaluator already caps the discount at the order amount, so
/// a negative total here means another component broke its contract.
fn order_total(subtotal: Decimal, discount_amount: Decimal, shipping_cost: Decimal) -> Decimal {
    let total = subtotal - discount_amount + shipping_cost;
    if total < Decimal::ZERO {
        tracing::error!(
            %subtotal,
            %discount_amount,
            %shipping_cost,
            "Order total went negative, clamping to zero"
        );
        return Decimal::ZERO;
    }
    total
}

fn snapshot_line(line: &shared::models::CartItem) -> OrderItem {
    OrderItem {
        product_id: line.product_id.clone(),
        variant_id: line.variant_id.clone(),
        product_name: line.product_name.clone(),
        product_price: line.effective_unit_price(),
        variant_info: line.variant_label.clone(),
        quantity: line.quantity,
        line_total: line.line_total(),
    }
}

/// `ORD-<year>-<6 random digits>`
///
/// Uniqueness comes from the insert-if-absent reservation in
/// [`CheckoutService::place_order`], not from the digits themselves.
fn generate_order_number() -> String {
    let digits: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD-{}-{:06}", Utc::now().year(), digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number();
        let year = Utc::now().year().to_string();
        assert!(number.starts_with(&format!("ORD-{}-", year)));
        assert_eq!(number.len(), 4 + year.len() + 7);
    }

    #[test]
    fn test_order_total_clamps_and_never_goes_negative() {
        assert_eq!(order_total(dec("100"), dec("20"), dec("50")), dec("130"));
        assert_eq!(order_total(dec("100"), dec("100"), dec("0")), dec("0"));
        // Broken upstream contract: clamped, not propagated
        assert_eq!(order_total(dec("100"), dec("150"), dec("0")), Decimal::ZERO);
    }
}
