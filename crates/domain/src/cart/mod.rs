//! Per-user shopping cart.

mod aggregate;
mod checkout;
mod events;
mod service;

pub use aggregate::{Cart, CartItem, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, coerce_quantity};
pub use checkout::{CheckoutSource, SessionCart, StoredCart};
pub use events::{CartEvent, ItemAddedData, ItemRemovedData, QuantitySetData};
pub use service::{CartLine, CartService};

use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The cart already holds the maximum number of distinct products.
    #[error("Cart is full: at most {capacity} different products")]
    CartFull { capacity: usize },
}
