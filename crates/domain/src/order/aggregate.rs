//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::UserId;
use journal::{StreamKind, Version};

use crate::aggregate::Aggregate;
use crate::value_objects::Money;

use super::{
    LineInput, OrderError, OrderEvent, OrderId, OrderLine, OrderStatus, PaymentMethod,
    events::{OrderCancelledData, OrderPlacedData, StatusAdvancedData},
};

/// Order aggregate root.
///
/// An immutable snapshot of what was bought, plus a status that only moves
/// forward or to `Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct Order {
    id: Option<OrderId>,
    version: Version,
    owner: Option<UserId>,
    lines: Vec<OrderLine>,
    shipping_address: String,
    payment_method: Option<PaymentMethod>,
    total: Money,
    status: OrderStatus,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn stream_kind() -> StreamKind {
        StreamKind::Order
    }

    fn owner(&self) -> Option<UserId> {
        self.owner
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => {
                self.id = Some(data.order_id);
                self.owner = Some(data.owner);
                self.lines = data.lines;
                self.shipping_address = data.shipping_address;
                self.payment_method = Some(data.payment_method);
                self.total = data.total;
                self.status = OrderStatus::Processing;
                self.created_at = Some(data.placed_at);
                self.updated_at = Some(data.placed_at);
            }
            OrderEvent::StatusAdvanced(data) => {
                self.status = data.to;
                self.updated_at = Some(data.at);
            }
            OrderEvent::OrderCancelled(data) => {
                self.status = OrderStatus::Cancelled;
                self.updated_at = Some(data.at);
            }
        }
    }
}

// Query methods
impl Order {
    /// Returns the order ID, or None before placement.
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    /// Returns the lines in the order they were placed.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Returns the payment method.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Returns the total fixed at placement.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns when the order was placed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns when the status last changed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true if the order is placed and owned by `user`.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.id.is_some() && self.owner == Some(user)
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order from priced lines.
    pub fn place(
        &self,
        order_id: OrderId,
        owner: UserId,
        items: Vec<LineInput>,
        shipping_address: &str,
        payment_method: PaymentMethod,
        placed_at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(OrderError::validation(
                "shipping_address",
                "must not be blank",
            ));
        }
        if items.is_empty() {
            return Err(OrderError::validation("items", "must not be empty"));
        }
        for item in &items {
            if item.product_id.as_str().trim().is_empty() {
                return Err(OrderError::validation("items", "product id is required"));
            }
            if item.quantity == 0 {
                return Err(OrderError::validation(
                    "items",
                    format!("quantity of {} must be at least 1", item.product_id),
                ));
            }
            if item.unit_price.is_negative() {
                return Err(OrderError::validation(
                    "items",
                    format!("price of {} must not be negative", item.product_id),
                ));
            }
        }

        let lines: Vec<OrderLine> = items.into_iter().map(OrderLine::from).collect();
        let total = lines
            .iter()
            .try_fold(Money::zero(), |total, line| {
                line.unit_price
                    .checked_multiply(line.quantity)
                    .and_then(|subtotal| total.checked_add(subtotal))
            })
            .ok_or_else(|| OrderError::validation("items", "total out of range"))?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            owner,
            lines,
            shipping_address: shipping_address.to_string(),
            payment_method,
            total,
            placed_at,
        })])
    }

    /// Moves the order forward to `target`.
    ///
    /// Produces nothing if the order is terminal or already at or past
    /// `target`; deferred advances rely on this to become no-ops.
    pub fn advance_to(
        &self,
        target: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotFound);
        }
        if target.stage().is_none() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        if !self.status.can_advance_to(target) {
            return Ok(vec![]);
        }

        Ok(vec![OrderEvent::StatusAdvanced(StatusAdvancedData {
            from: self.status,
            to: target,
            at,
        })])
    }

    /// Cancels the order on behalf of `requested_by`.
    ///
    /// Orders of other users are reported as not found.
    pub fn cancel(
        &self,
        requested_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.is_owned_by(requested_by) {
            return Err(OrderError::NotFound);
        }
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Cancelled,
            });
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelledData {
            from: self.status,
            at,
        })])
    }
}
