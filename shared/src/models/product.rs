//! Product catalog model
//!
//! Only the slice of the catalog the pricing engine needs: selling price,
//! variant price addons and stock on hand. Descriptions, images and the
//! rest of the merchandising surface live outside the engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A sellable variant of a product (e.g. a size/colour combination)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: String,
    /// Display label, e.g. "M - Maroon"
    pub label: String,
    /// Charged on top of the product's selling price
    pub additional_price: Decimal,
    pub stock_quantity: u32,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub selling_price: Decimal,
    /// Stock for the variant-less purchase path
    pub stock_quantity: u32,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    pub is_active: bool,
}

impl Product {
    pub fn variant(&self, variant_id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_lookup() {
        let product = Product {
            id: "p1".into(),
            name: "Silk Dupatta".into(),
            selling_price: Decimal::new(79900, 2),
            stock_quantity: 10,
            variants: vec![ProductVariant {
                id: "v1".into(),
                label: "Free Size - Gold".into(),
                additional_price: Decimal::new(5000, 2),
                stock_quantity: 4,
            }],
            is_active: true,
        };
        assert!(product.variant("v1").is_some());
        assert!(product.variant("v2").is_none());
    }
}
