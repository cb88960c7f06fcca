//! Pricing calculators
//!
//! Pure decimal arithmetic over three levels: a single line, a cart, an
//! invoice. Every service routes its money math through these functions;
//! nothing else in the engine multiplies prices.

mod cart;
mod invoice;
mod line_item;

pub use cart::*;
pub use invoice::*;
pub use line_item::*;
