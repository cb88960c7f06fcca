use rust_decimal::Decimal;

/// Store configuration - every tunable of the pricing engine
///
/// Assembled once at process start and passed by reference (or `Arc`) to
/// the services; request handlers never consult the environment.
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | STORE_CURRENCY | INR | Display currency code |
/// | FREE_SHIPPING_THRESHOLD | 999 | Cart total at which shipping is free |
/// | EXPRESS_SHIPPING_COST | 50 | Flat shipping cost below the threshold |
/// | DEFAULT_TAX_RATE | 18 | GST percentage applied when unspecified |
/// | INVOICE_PREFIX | INV | Prefix for sequential invoice numbers |
/// | ORDER_NUMBER_RETRY_LIMIT | 3 | Attempts at a unique order number |
///
/// # Example
///
/// ```ignore
/// FREE_SHIPPING_THRESHOLD=1499 EXPRESS_SHIPPING_COST=79 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Display currency; the engine is single-currency
    pub currency: String,
    /// Cart totals at or above this ship free
    pub free_shipping_threshold: Decimal,
    /// Flat express cost charged below the threshold
    pub express_shipping_cost: Decimal,
    /// Tax percentage used when an invoice line does not specify one
    pub default_tax_rate: Decimal,
    /// Invoice number prefix, e.g. "INV" -> INV0001
    pub invoice_prefix: String,
    /// Bounded retries when an order number collides
    pub order_number_retry_limit: u32,
}

impl StoreConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            currency: std::env::var("STORE_CURRENCY").unwrap_or_else(|_| "INR".into()),
            free_shipping_threshold: env_decimal("FREE_SHIPPING_THRESHOLD", Decimal::new(999, 0)),
            express_shipping_cost: env_decimal("EXPRESS_SHIPPING_COST", Decimal::new(50, 0)),
            default_tax_rate: env_decimal("DEFAULT_TAX_RATE", Decimal::new(18, 0)),
            invoice_prefix: std::env::var("INVOICE_PREFIX").unwrap_or_else(|_| "INV".into()),
            order_number_retry_limit: std::env::var("ORDER_NUMBER_RETRY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            currency: "INR".into(),
            free_shipping_threshold: Decimal::new(999, 0),
            express_shipping_cost: Decimal::new(50, 0),
            default_tax_rate: Decimal::new(18, 0),
            invoice_prefix: "INV".into(),
            order_number_retry_limit: 3,
        }
    }
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.currency, "INR");
        assert_eq!(config.free_shipping_threshold, Decimal::new(999, 0));
        assert_eq!(config.express_shipping_cost, Decimal::new(50, 0));
        assert_eq!(config.default_tax_rate, Decimal::new(18, 0));
        assert_eq!(config.invoice_prefix, "INV");
        assert_eq!(config.order_number_retry_limit, 3);
    }
}
