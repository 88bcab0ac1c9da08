//! Order listing for one owner.

use common::UserId;
use domain::{Aggregate, CommandHandler, DomainError, Order, OrderId, Timeouts};
use journal::Journal;

use crate::filter::parse_status_filter;

/// Query service over the orders in the journal.
pub struct OrderQueryService<J: Journal> {
    handler: CommandHandler<J, Order>,
}

impl<J: Journal> OrderQueryService<J> {
    /// Creates a new query service.
    pub fn new(journal: J, timeouts: Timeouts) -> Self {
        Self {
            handler: CommandHandler::new(journal, timeouts.journal),
        }
    }

    /// Lists the owner's orders, newest first.
    ///
    /// `status_filter` keeps only orders in that status; an unrecognised
    /// value is ignored.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_owner(
        &self,
        owner: UserId,
        status_filter: Option<&str>,
    ) -> Result<Vec<Order>, DomainError> {
        let status = parse_status_filter(status_filter);
        let stream_ids = self
            .handler
            .bounded(
                "journal owner scan",
                self.handler
                    .journal()
                    .streams_for_owner(Order::stream_kind(), owner),
            )
            .await?;

        let mut orders = Vec::with_capacity(stream_ids.len());
        for stream_id in stream_ids {
            let Some(order) = self.handler.load_existing(stream_id).await? else {
                continue;
            };
            if status.is_some_and(|s| order.status() != s) {
                continue;
            }
            orders.push(order);
        }

        // Streams come oldest first; reversing keeps ties newest first.
        orders.reverse();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        tracing::debug!(%owner, count = orders.len(), "orders listed");
        Ok(orders)
    }

    /// Returns one of the owner's orders.
    ///
    /// Orders of other users are reported as not found.
    #[tracing::instrument(skip(self))]
    pub async fn get_for_owner(
        &self,
        order_id: OrderId,
        owner: UserId,
    ) -> Result<Order, DomainError> {
        match self.handler.load_existing(order_id.stream_id()).await? {
            Some(order) if order.is_owned_by(owner) => Ok(order),
            _ => Err(DomainError::not_found("Order", order_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineInput, Money, NoopRegistrar, OrderService, ProductId};
    use journal::InMemoryJournal;

    fn services() -> (
        OrderService<InMemoryJournal, NoopRegistrar>,
        OrderQueryService<InMemoryJournal>,
    ) {
        let journal = InMemoryJournal::new();
        (
            OrderService::new(journal.clone(), NoopRegistrar, Timeouts::default()),
            OrderQueryService::new(journal, Timeouts::default()),
        )
    }

    async fn place(orders: &OrderService<InMemoryJournal, NoopRegistrar>, owner: UserId) -> Order {
        orders
            .create_from_items(
                owner,
                vec![LineInput {
                    product_id: ProductId::new("p1"),
                    name: "Nimbus Keyboard".to_string(),
                    unit_price: Money::from_cents(1000),
                    quantity: 1,
                }],
                "Manila",
                "bank",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_is_per_owner_and_newest_first() {
        let (orders, queries) = services();
        let alice = UserId::new();
        let first = place(&orders, alice).await;
        let second = place(&orders, alice).await;
        place(&orders, UserId::new()).await;

        let listed = queries.list_for_owner(alice, None).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![second.id(), first.id()]);
    }

    #[tokio::test]
    async fn test_list_for_owner_without_orders() {
        let (_, queries) = services();
        assert!(queries.list_for_owner(UserId::new(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_for_owner() {
        let (orders, queries) = services();
        let owner = UserId::new();
        let order = place(&orders, owner).await;
        let order_id = order.id().unwrap();

        let found = queries.get_for_owner(order_id, owner).await.unwrap();
        assert_eq!(found.total(), order.total());

        assert!(matches!(
            queries.get_for_owner(order_id, UserId::new()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            queries.get_for_owner(OrderId::new(), owner).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
