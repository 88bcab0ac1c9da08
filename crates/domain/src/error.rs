//! Domain error types.

use std::time::Duration;

use journal::JournalError;
use thiserror::Error;

use crate::cart::CartError;
use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the journal.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// A cart command was rejected.
    #[error("Cart error: {0}")]
    Cart(CartError),

    /// An order command was rejected.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// The addressed entity does not exist for this caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A call to the journal or the catalog did not finish in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The catalog could not answer.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Creates a not-found error for an entity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DomainError::Journal(e) => e.is_transient(),
            DomainError::Timeout { .. } | DomainError::CatalogUnavailable(_) => true,
            _ => false,
        }
    }
}

impl From<CartError> for DomainError {
    fn from(e: CartError) -> Self {
        DomainError::Cart(e)
    }
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StreamId;
    use journal::Version;

    #[test]
    fn test_transient_classification() {
        let conflict = DomainError::Journal(JournalError::ConcurrencyConflict {
            stream_id: StreamId::new(),
            expected: Version::first(),
            actual: Version::new(2),
        });
        assert!(conflict.is_transient());

        let timeout = DomainError::Timeout {
            operation: "journal read",
            after: Duration::from_millis(10),
        };
        assert!(timeout.is_transient());
        assert!(DomainError::CatalogUnavailable("down".into()).is_transient());

        assert!(!DomainError::not_found("Order", "x").is_transient());
        assert!(!DomainError::Order(OrderError::EmptyCart).is_transient());
        assert!(!DomainError::Cart(CartError::CartFull { capacity: 30 }).is_transient());
    }

    #[test]
    fn test_not_found_message() {
        let err = DomainError::not_found("Order", "abc");
        assert_eq!(err.to_string(), "Order not found: abc");
    }
}
