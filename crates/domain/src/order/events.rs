//! Order domain events.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::Money;

use super::{OrderId, OrderLine, OrderStatus, PaymentMethod};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed with status `Processing`.
    OrderPlaced(OrderPlacedData),

    /// Order moved forward on the fulfillment path.
    StatusAdvanced(StatusAdvancedData),

    /// Order was cancelled by its owner.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::StatusAdvanced(_) => "StatusAdvanced",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

impl OrderEvent {
    /// Returns the status the order has after this event.
    pub fn resulting_status(&self) -> OrderStatus {
        match self {
            OrderEvent::OrderPlaced(_) => OrderStatus::Processing,
            OrderEvent::StatusAdvanced(data) => data.to,
            OrderEvent::OrderCancelled(_) => OrderStatus::Cancelled,
        }
    }

    /// Returns the status the order had before this event, if any.
    pub fn previous_status(&self) -> Option<OrderStatus> {
        match self {
            OrderEvent::OrderPlaced(_) => None,
            OrderEvent::StatusAdvanced(data) => Some(data.from),
            OrderEvent::OrderCancelled(data) => Some(data.from),
        }
    }

    /// Returns when the event happened.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(data) => data.placed_at,
            OrderEvent::StatusAdvanced(data) => data.at,
            OrderEvent::OrderCancelled(data) => data.at,
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: OrderId,
    pub owner: UserId,
    pub lines: Vec<OrderLine>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    /// Sum of the line subtotals, fixed at placement.
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

/// Data for StatusAdvanced event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAdvancedData {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

/// Data for OrderCancelled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub from: OrderStatus,
    pub at: DateTime<Utc>,
}
