//! Storefront pricing & order totals engine
//!
//! In-process core for a retail clothing storefront: deterministic decimal
//! pricing, cart aggregation, coupon evaluation, order assembly and
//! invoice totals. The web layer above it owns rendering, sessions and
//! persistence; this crate owns monetary correctness.
//!
//! # Module structure
//!
//! ```text
//! store-engine/src/
//! ├── config.rs      # Static configuration, assembled once at startup
//! ├── logger.rs      # tracing bootstrap
//! ├── catalog.rs     # In-memory product catalog (price/addon/stock)
//! ├── pricing/       # Pure calculators: line item, cart, invoice
//! ├── coupon.rs      # Coupon evaluation and atomic redemption
//! ├── cart.rs        # Per-owner carts with serialized mutation
//! ├── checkout.rs    # Order assembly (snapshot at placement)
//! └── billing.rs     # Invoice service with sequential numbering
//! ```

pub mod billing;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod logger;
pub mod pricing;

// Re-export public service types
pub use billing::{InvoiceDraft, InvoiceService, LineItemInput};
pub use cart::CartService;
pub use catalog::{CatalogService, ResolvedProduct};
pub use checkout::CheckoutService;
pub use config::StoreConfig;
pub use coupon::CouponService;
pub use pricing::{InvoiceTotals, LineItemPricing};

// Re-export shared foundations for embedders
pub use shared::error::{StoreError, StoreResult};
pub use shared::models;

// Re-export logger functions
pub use logger::{init_logger, init_logger_with_file};
