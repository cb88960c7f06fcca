//! Shared types for the storefront engine
//!
//! Domain models, money arithmetic helpers and the unified error type
//! used by the pricing, cart, checkout and billing services.

pub mod error;
pub mod models;
pub mod money;

// Re-exports
pub use error::{StoreError, StoreResult};
pub use serde::{Deserialize, Serialize};
