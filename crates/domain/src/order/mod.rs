//! Order aggregate and related types.

mod aggregate;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use events::{OrderCancelledData, OrderEvent, OrderPlacedData, StatusAdvancedData};
pub use service::{NoopRegistrar, OrderRegistrar, OrderService};
pub use state::{OrderStatus, UnknownStatus};
pub use value_objects::{LineInput, OrderId, OrderLine, PaymentMethod};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// A required field is missing or malformed.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Checkout was attempted on a cart with nothing in it.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order's current status does not allow the requested change.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// No placed order matches, or it belongs to someone else.
    #[error("Order not found")]
    NotFound,

    /// The stream already holds a placed order.
    #[error("Order already placed")]
    AlreadyPlaced,
}

impl OrderError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
