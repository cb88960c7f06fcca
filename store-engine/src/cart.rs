//! Cart service
//!
//! One cart per owner, held in a `DashMap`. Every mutation runs under the
//! map's entry guard, so concurrent requests touching the same cart
//! serialize and read-modify-write updates are never lost. Line prices are
//! re-resolved from the catalog whenever totals are computed, so a price
//! change lands in the next cart view, not at some cached earlier value.

use dashmap::DashMap;
use shared::error::{StoreError, StoreResult};
use shared::models::{Cart, CartItem, CartOwner, CartTotals};
use shared::money::require_quantity;
use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::StoreConfig;
use crate::pricing::aggregate_cart;

/// In-memory carts keyed by owner
#[derive(Clone)]
pub struct CartService {
    config: Arc<StoreConfig>,
    catalog: CatalogService,
    carts: Arc<DashMap<CartOwner, Cart>>,
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("carts", &self.carts.len())
            .finish()
    }
}

impl CartService {
    pub fn new(config: Arc<StoreConfig>, catalog: CatalogService) -> Self {
        Self {
            config,
            catalog,
            carts: Arc::new(DashMap::new()),
        }
    }

    /// Add a line, merging with an existing (product, variant) pair
    ///
    /// Price, name and addon come from the catalog at call time. The stock
    /// check covers the merged quantity, and a failed check leaves the
    /// cart untouched.
    pub fn add_item(
        &self,
        owner: &CartOwner,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: u32,
    ) -> StoreResult<()> {
        require_quantity(quantity, "quantity")?;
        let resolved = self.catalog.resolve(product_id, variant_id)?;

        let mut entry = self
            .carts
            .entry(owner.clone())
            .or_insert_with(|| Cart::new(owner.clone()));
        let cart = entry.value_mut();

        let already_in_cart = cart
            .find_line(product_id, variant_id)
            .map(|l| l.quantity)
            .unwrap_or(0);
        let requested = already_in_cart + quantity;
        if requested > resolved.available_stock {
            return Err(StoreError::InsufficientStock {
                product: resolved.name,
                requested,
                available: resolved.available_stock,
            });
        }

        cart.merge_line(CartItem {
            product_id: resolved.product_id,
            variant_id: resolved.variant_id,
            product_name: resolved.name,
            unit_price: resolved.unit_price,
            variant_addon: resolved.variant_addon,
            variant_label: resolved.variant_label,
            quantity,
            added_at: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Set a line's quantity; 0 removes the line
    pub fn update_quantity(
        &self,
        owner: &CartOwner,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: u32,
    ) -> StoreResult<()> {
        if quantity == 0 {
            return self.remove_item(owner, product_id, variant_id);
        }
        require_quantity(quantity, "quantity")?;
        let resolved = self.catalog.resolve(product_id, variant_id)?;
        if quantity > resolved.available_stock {
            return Err(StoreError::InsufficientStock {
                product: resolved.name,
                requested: quantity,
                available: resolved.available_stock,
            });
        }

        let mut cart = self
            .carts
            .get_mut(owner)
            .ok_or_else(|| StoreError::not_found("cart"))?;
        if !cart.set_quantity(product_id, variant_id, quantity) {
            return Err(StoreError::not_found("cart line"));
        }
        Ok(())
    }

    pub fn remove_item(
        &self,
        owner: &CartOwner,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> StoreResult<()> {
        let mut cart = self
            .carts
            .get_mut(owner)
            .ok_or_else(|| StoreError::not_found("cart"))?;
        if !cart.remove_line(product_id, variant_id) {
            return Err(StoreError::not_found("cart line"));
        }
        Ok(())
    }

    /// Drop the owner's cart entirely
    pub fn clear(&self, owner: &CartOwner) {
        self.carts.remove(owner);
    }

    pub fn get(&self, owner: &CartOwner) -> Option<Cart> {
        self.carts.get(owner).map(|c| c.value().clone())
    }

    /// Aggregate the owner's cart, re-pricing lines from the catalog first
    ///
    /// An absent cart aggregates to zero.
    pub fn totals(&self, owner: &CartOwner) -> CartTotals {
        match self.carts.get_mut(owner) {
            Some(mut entry) => {
                let cart = entry.value_mut();
                self.refresh_prices(cart);
                aggregate_cart(&cart.items, self.config.free_shipping_threshold)
            }
            None => aggregate_cart(&[], self.config.free_shipping_threshold),
        }
    }

    /// Atomically remove and return a non-empty cart for checkout
    ///
    /// Removal under the entry guard makes "read cart, snapshot, clear"
    /// one logical operation: a second checkout for the same owner finds
    /// no cart and fails with EmptyCart instead of double-ordering.
    pub fn take_for_checkout(&self, owner: &CartOwner) -> StoreResult<Cart> {
        let (_, mut cart) = self
            .carts
            .remove(owner)
            .ok_or(StoreError::EmptyCart)?;
        if cart.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        self.refresh_prices(&mut cart);
        Ok(cart)
    }

    /// Put a cart back after a failed checkout
    ///
    /// Lines added by the owner in the meantime are kept and merged.
    pub fn restore(&self, cart: Cart) {
        let mut entry = self
            .carts
            .entry(cart.owner.clone())
            .or_insert_with(|| Cart::new(cart.owner.clone()));
        for line in cart.items {
            entry.value_mut().merge_line(line);
        }
    }

    /// Re-resolve line prices from the catalog
    ///
    /// A line whose product disappeared keeps its last known price.
    fn refresh_prices(&self, cart: &mut Cart) {
        for line in &mut cart.items {
            match self
                .catalog
                .resolve(&line.product_id, line.variant_id.as_deref())
            {
                Ok(resolved) => {
                    line.unit_price = resolved.unit_price;
                    line.variant_addon = resolved.variant_addon;
                }
                Err(_) => {
                    tracing::warn!(
                        product_id = %line.product_id,
                        "Cart line no longer resolvable, keeping last known price"
                    );
                }
            }
        }
    }
}
