//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fulfillment status of an order.
///
/// ```text
/// Processing ──► Packing ──► Delivering ──► Delivered
///     │             │             │
///     └─────────────┴─────────────┴──► Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum OrderStatus {
    /// Placed, awaiting packing.
    #[default]
    Processing,

    /// Being packed.
    Packing,

    /// Handed to the courier.
    Delivering,

    /// Received by the customer (terminal).
    Delivered,

    /// Cancelled by the customer (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Every status, in declaration order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Processing,
        OrderStatus::Packing,
        OrderStatus::Delivering,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// The statuses an order moves through on its own after placement.
    pub const PROGRESSION: [OrderStatus; 3] = [
        OrderStatus::Packing,
        OrderStatus::Delivering,
        OrderStatus::Delivered,
    ];

    /// Returns the position on the fulfillment path, or None for `Cancelled`.
    pub fn stage(&self) -> Option<u8> {
        match self {
            OrderStatus::Processing => Some(0),
            OrderStatus::Packing => Some(1),
            OrderStatus::Delivering => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the order can be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `target` is strictly further along the fulfillment
    /// path and this status is not terminal.
    pub fn can_advance_to(&self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.stage(), target.stage()) {
            (Some(current), Some(next)) => next > current,
            _ => false,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Packing => "Packing",
            OrderStatus::Delivering => "Delivering",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    /// Parses the exact status name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
