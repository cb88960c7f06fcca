//! Domain models for the storefront engine

pub mod cart;
pub mod coupon;
pub mod invoice;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem, CartOwner, CartTotals};
pub use coupon::{Coupon, CouponDiscount, DiscountType};
pub use invoice::{Invoice, InvoiceLineItem, InvoicePayment, InvoicePaymentMethod, InvoiceStatus};
pub use order::{Address, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
pub use product::{Product, ProductVariant};
