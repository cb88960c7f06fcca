//! Unified error system for the storefront engine
//!
//! Every fallible operation in the engine returns [`StoreResult`]. The
//! variants are the engine's complete error surface; the embedding layer
//! maps each kind to its own user-facing message via [`StoreError::kind`]
//! and the structured fields, never by parsing the display text.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for engine operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for all pricing, cart, checkout and billing operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Malformed or out-of-range numeric input, rejected before computation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Checkout attempted with no cart lines
    #[error("cart is empty")]
    EmptyCart,

    /// Shipping address missing or incomplete
    #[error("shipping address is incomplete: missing {field}")]
    MissingAddress { field: &'static str },

    /// No coupon exists under the given code
    #[error("coupon code not found")]
    CouponNotFound,

    /// Coupon is inactive, outside its validity window, or used up
    #[error("coupon is not valid or has expired")]
    CouponExpired,

    /// Order amount below the coupon's minimum
    #[error("minimum order amount is {minimum}")]
    MinimumOrderNotMet {
        minimum: Decimal,
        /// How much the order is short of the minimum
        shortfall: Decimal,
    },

    /// Requested quantity exceeds available stock
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    /// Order or invoice number already taken
    #[error("identifier already exists: {0}")]
    DuplicateIdentifier(String),

    /// Optimistic update lost the race and the bounded retry budget ran out
    #[error("concurrent update conflict, gave up after {retries} retries")]
    ConcurrencyConflict { retries: u32 },

    /// Referenced order, invoice or product does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Status change not allowed by the entity's state machine
    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

impl StoreError {
    // ========== Convenient constructors ==========

    /// Create an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a DuplicateIdentifier error
    pub fn duplicate(identifier: impl Into<String>) -> Self {
        Self::DuplicateIdentifier(identifier.into())
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    // ========== Error inspection ==========

    /// Stable machine-readable kind, for mapping to user-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::EmptyCart => "EMPTY_CART",
            Self::MissingAddress { .. } => "MISSING_ADDRESS",
            Self::CouponNotFound => "COUPON_NOT_FOUND",
            Self::CouponExpired => "COUPON_EXPIRED",
            Self::MinimumOrderNotMet { .. } => "MINIMUM_ORDER_NOT_MET",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::DuplicateIdentifier(_) => "DUPLICATE_IDENTIFIER",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Whether the operation may be retried as-is
    ///
    /// Only lost optimistic updates are retryable; every other kind needs
    /// a changed request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
