//! Order service: turns carts and item lists into placed orders.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::UserId;
use journal::Journal;

use crate::cart::CheckoutSource;
use crate::command::CommandHandler;
use crate::config::Timeouts;
use crate::error::DomainError;

use super::{LineInput, Order, OrderError, OrderId, PaymentMethod};

/// Receives every newly placed order, e.g. to schedule its fulfillment.
#[async_trait]
pub trait OrderRegistrar: Send + Sync {
    /// Called once after the order has been persisted.
    async fn register(&self, order: &Order);
}

#[async_trait]
impl<T: OrderRegistrar + ?Sized> OrderRegistrar for Arc<T> {
    async fn register(&self, order: &Order) {
        (**self).register(order).await
    }
}

/// Registrar that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistrar;

#[async_trait]
impl OrderRegistrar for NoopRegistrar {
    async fn register(&self, _order: &Order) {}
}

/// Service for placing and loading orders.
pub struct OrderService<J: Journal, R: OrderRegistrar> {
    handler: CommandHandler<J, Order>,
    registrar: R,
}

impl<J: Journal, R: OrderRegistrar> OrderService<J, R> {
    /// Creates a new order service.
    pub fn new(journal: J, registrar: R, timeouts: Timeouts) -> Self {
        Self {
            handler: CommandHandler::new(journal, timeouts.journal),
            registrar,
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<J, Order> {
        &self.handler
    }

    /// Places an order from caller-priced items.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create_from_items(
        &self,
        owner: UserId,
        items: Vec<LineInput>,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<Order, DomainError> {
        let payment_method = parse_payment_method(payment_method)?;
        let order_id = OrderId::new();

        let result = self
            .handler
            .execute(order_id.stream_id(), Some(owner), |order| {
                order.place(
                    order_id,
                    owner,
                    items,
                    shipping_address,
                    payment_method,
                    Utc::now(),
                )
            })
            .await?;
        let order = result.aggregate;

        metrics::counter!("orders_placed_total", "payment_method" => payment_method.as_str())
            .increment(1);
        tracing::info!(%order_id, %owner, total = %order.total(), "order placed");

        self.registrar.register(&order).await;
        Ok(order)
    }

    /// Places an order from a cart and removes the ordered lines from it.
    ///
    /// A failure to clear the cart is logged; the order stands.
    #[tracing::instrument(skip(self, cart))]
    pub async fn create_from_cart<S>(
        &self,
        owner: UserId,
        cart: &S,
        shipping_address: &str,
        payment_method: &str,
    ) -> Result<Order, DomainError>
    where
        S: CheckoutSource + ?Sized,
    {
        if shipping_address.trim().is_empty() {
            return Err(OrderError::validation("shipping_address", "must not be blank").into());
        }
        parse_payment_method(payment_method)?;

        let lines = cart.checkout_lines().await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart.into());
        }

        let order = self
            .create_from_items(owner, lines.clone(), shipping_address, payment_method)
            .await?;

        if let Err(e) = cart.clear(&lines).await {
            tracing::warn!(error = %e, order_id = ?order.id(), "order placed but cart not cleared");
        }

        Ok(order)
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id.stream_id()).await
    }
}

fn parse_payment_method(raw: &str) -> Result<PaymentMethod, OrderError> {
    raw.trim()
        .parse()
        .map_err(|reason: String| OrderError::validation("payment_method", reason))
}
