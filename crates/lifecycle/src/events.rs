//! Status change events published by the engine.

use std::pin::Pin;

use chrono::{DateTime, Utc};
use common::UserId;
use domain::{OrderEvent, OrderId, OrderStatus};
use futures_core::Stream;
use serde::Serialize;

/// One status change of one order.
///
/// `from` is None for the placement itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub owner: UserId,
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    /// Describes the change recorded by an order event.
    pub fn from_event(order_id: OrderId, owner: UserId, event: &OrderEvent) -> Self {
        Self {
            order_id,
            owner,
            from: event.previous_status(),
            to: event.resulting_status(),
            at: event.occurred_at(),
        }
    }
}

/// A live stream of status changes.
pub type StatusStream = Pin<Box<dyn Stream<Item = StatusChange> + Send>>;
