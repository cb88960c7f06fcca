//! Catalog service - in-memory product lookup for the pricing engine
//!
//! The cart and checkout services resolve prices, variant addons and
//! stock through this service at call time, so cart lines and order
//! snapshots are priced from the latest catalog state, never a cached
//! request-scoped copy.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::error::{StoreError, StoreResult};
use shared::models::Product;
use std::collections::HashMap;
use std::sync::Arc;

/// The catalog's answer for one (product, variant) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProduct {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    /// Base selling price
    pub unit_price: Decimal,
    /// Variant addon on top of the base price
    pub variant_addon: Decimal,
    pub variant_label: Option<String>,
    /// Stock for the resolved variant (or the product when variant-less)
    pub available_stock: u32,
}

impl ResolvedProduct {
    pub fn effective_unit_price(&self) -> Decimal {
        self.unit_price + self.variant_addon
    }
}

/// In-memory product catalog
#[derive(Clone, Default)]
pub struct CatalogService {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("products", &self.products.read().len())
            .finish()
    }
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product
    pub fn upsert(&self, product: Product) {
        self.products.write().insert(product.id.clone(), product);
    }

    pub fn get(&self, product_id: &str) -> Option<Product> {
        self.products.read().get(product_id).cloned()
    }

    /// Change a product's selling price
    pub fn set_price(&self, product_id: &str, selling_price: Decimal) -> StoreResult<()> {
        let mut products = self.products.write();
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::not_found(format!("product {}", product_id)))?;
        product.selling_price = selling_price;
        Ok(())
    }

    /// Set stock for a product or one of its variants
    pub fn set_stock(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
        stock: u32,
    ) -> StoreResult<()> {
        let mut products = self.products.write();
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::not_found(format!("product {}", product_id)))?;
        match variant_id {
            None => product.stock_quantity = stock,
            Some(vid) => {
                let variant = product
                    .variants
                    .iter_mut()
                    .find(|v| v.id == vid)
                    .ok_or_else(|| StoreError::not_found(format!("variant {}", vid)))?;
                variant.stock_quantity = stock;
            }
        }
        Ok(())
    }

    /// Resolve current price, addon and stock for a (product, variant) pair
    pub fn resolve(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> StoreResult<ResolvedProduct> {
        let products = self.products.read();
        let product = products
            .get(product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| StoreError::not_found(format!("product {}", product_id)))?;

        match variant_id {
            None => Ok(ResolvedProduct {
                product_id: product.id.clone(),
                variant_id: None,
                name: product.name.clone(),
                unit_price: product.selling_price,
                variant_addon: Decimal::ZERO,
                variant_label: None,
                available_stock: product.stock_quantity,
            }),
            Some(vid) => {
                let variant = product
                    .variant(vid)
                    .ok_or_else(|| StoreError::not_found(format!("variant {}", vid)))?;
                Ok(ResolvedProduct {
                    product_id: product.id.clone(),
                    variant_id: Some(variant.id.clone()),
                    name: product.name.clone(),
                    unit_price: product.selling_price,
                    variant_addon: variant.additional_price,
                    variant_label: Some(variant.label.clone()),
                    available_stock: variant.stock_quantity,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ProductVariant;

    fn seed() -> CatalogService {
        let catalog = CatalogService::new();
        catalog.upsert(Product {
            id: "p1".into(),
            name: "Banarasi Dupatta".into(),
            selling_price: Decimal::new(129900, 2),
            stock_quantity: 12,
            variants: vec![ProductVariant {
                id: "v1".into(),
                label: "Gold Border".into(),
                additional_price: Decimal::new(15000, 2),
                stock_quantity: 5,
            }],
            is_active: true,
        });
        catalog
    }

    #[test]
    fn test_resolve_base_product() {
        let resolved = seed().resolve("p1", None).unwrap();
        assert_eq!(resolved.unit_price, Decimal::new(129900, 2));
        assert_eq!(resolved.variant_addon, Decimal::ZERO);
        assert_eq!(resolved.available_stock, 12);
    }

    #[test]
    fn test_resolve_variant_uses_variant_stock_and_addon() {
        let resolved = seed().resolve("p1", Some("v1")).unwrap();
        assert_eq!(resolved.effective_unit_price(), Decimal::new(144900, 2));
        assert_eq!(resolved.available_stock, 5);
        assert_eq!(resolved.variant_label.as_deref(), Some("Gold Border"));
    }

    #[test]
    fn test_resolve_unknown_or_inactive() {
        let catalog = seed();
        assert!(matches!(
            catalog.resolve("ghost", None),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            catalog.resolve("p1", Some("ghost")),
            Err(StoreError::NotFound(_))
        ));

        let mut product = catalog.get("p1").unwrap();
        product.is_active = false;
        catalog.upsert(product);
        assert!(catalog.resolve("p1", None).is_err());
    }

    #[test]
    fn test_price_change_visible_on_next_resolve() {
        let catalog = seed();
        catalog.set_price("p1", Decimal::new(99900, 2)).unwrap();
        let resolved = catalog.resolve("p1", None).unwrap();
        assert_eq!(resolved.unit_price, Decimal::new(99900, 2));
    }
}
