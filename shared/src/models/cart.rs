//! Cart model
//!
//! A cart belongs to exactly one owner: an authenticated customer or an
//! anonymous session key. It is mutable until checkout and destroyed when
//! an order is placed from it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who a cart belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind", content = "id")]
pub enum CartOwner {
    Customer(String),
    Session(String),
}

impl CartOwner {
    /// Customer id when the owner is an authenticated customer
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            Self::Customer(id) => Some(id),
            Self::Session(_) => None,
        }
    }
}

impl std::fmt::Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer(id) => write!(f, "customer:{}", id),
            Self::Session(key) => write!(f, "session:{}", key),
        }
    }
}

/// A single line in a cart
///
/// One line per (product, variant) pair; adding the same pair again merges
/// quantities. Price fields are resolved from the catalog when the line is
/// created or updated, not cached from an earlier request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    /// Base selling price of the product
    pub unit_price: Decimal,
    /// Variant addon charged on top of the base price
    pub variant_addon: Decimal,
    /// Variant display label, e.g. "M - Maroon"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Base price plus variant addon
    pub fn effective_unit_price(&self) -> Decimal {
        self.unit_price + self.variant_addon
    }

    /// `effective_unit_price * quantity`
    pub fn line_total(&self) -> Decimal {
        self.effective_unit_price() * Decimal::from(self.quantity)
    }

    pub fn matches(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }
}

/// Shopping cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub owner: CartOwner,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(owner: CartOwner) -> Self {
        let now = Utc::now();
        Self {
            owner,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_line(&self, product_id: &str, variant_id: Option<&str>) -> Option<&CartItem> {
        self.items.iter().find(|i| i.matches(product_id, variant_id))
    }

    /// Add a line, merging quantities with an existing (product, variant) pair
    pub fn merge_line(&mut self, line: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|i| i.matches(&line.product_id, line.variant_id.as_deref()))
        {
            Some(existing) => {
                existing.quantity += line.quantity;
                // Refresh the price snapshot to the latest catalog values
                existing.unit_price = line.unit_price;
                existing.variant_addon = line.variant_addon;
            }
            None => self.items.push(line),
        }
        self.touch();
    }

    /// Set a line's quantity; 0 removes the line
    ///
    /// Returns false if no such line exists.
    pub fn set_quantity(&mut self, product_id: &str, variant_id: Option<&str>, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_line(product_id, variant_id);
        }
        match self
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
        {
            Some(line) => {
                line.quantity = quantity;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn remove_line(&mut self, product_id: &str, variant_id: Option<&str>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, variant_id));
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Aggregated cart figures, computed fresh on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line quantities
    pub total_items: u32,
    /// Sum of line totals (effective unit price * quantity)
    pub total_amount: Decimal,
    pub free_shipping_eligible: bool,
}
