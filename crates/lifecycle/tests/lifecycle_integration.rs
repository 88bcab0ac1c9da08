//! Integration tests for the order lifecycle engine.
//!
//! These tests cover recovery after a restart, the status stream, the
//! background worker and races between cancellation and automatic advances.

use std::sync::Arc;
use std::time::Duration;

use common::UserId;
use domain::{LineInput, Money, Order, OrderId, OrderService, OrderStatus, ProductId, Timeouts};
use futures_util::StreamExt;
use journal::{InMemoryJournal, Journal};
use lifecycle::{InMemoryNotificationSink, LifecycleConfig, LifecycleEngine};
use tokio::sync::watch;

type Engine = LifecycleEngine<InMemoryJournal, InMemoryNotificationSink>;

fn engine(journal: &InMemoryJournal, config: LifecycleConfig) -> Arc<Engine> {
    Arc::new(LifecycleEngine::new(
        journal.clone(),
        InMemoryNotificationSink::new(),
        config,
        Timeouts::default(),
    ))
}

fn orders(
    journal: &InMemoryJournal,
    engine: &Arc<Engine>,
) -> OrderService<InMemoryJournal, Arc<Engine>> {
    OrderService::new(journal.clone(), Arc::clone(engine), Timeouts::default())
}

async fn place(orders: &OrderService<InMemoryJournal, Arc<Engine>>, owner: UserId) -> Order {
    orders
        .create_from_items(
            owner,
            vec![LineInput {
                product_id: ProductId::new("p1"),
                name: "Aurora Headphones".to_string(),
                unit_price: Money::from_cents(500),
                quantity: 1,
            }],
            "Quezon City",
            "gcash",
        )
        .await
        .unwrap()
}

async fn status_of(
    journal: &InMemoryJournal,
    engine: &Arc<Engine>,
    order_id: OrderId,
) -> OrderStatus {
    orders(journal, engine)
        .get_order(order_id)
        .await
        .unwrap()
        .unwrap()
        .status()
}

mod recovery {
    use super::*;

    #[tokio::test]
    async fn pending_advances_survive_a_restart() {
        let journal = InMemoryJournal::new();
        let owner = UserId::new();

        let (processing, packed, cancelled) = {
            let before = engine(&journal, LifecycleConfig::default());
            let service = orders(&journal, &before);
            let processing = place(&service, owner).await;
            let packed = place(&service, owner).await;
            let cancelled = place(&service, owner).await;

            before
                .advance(packed.id().unwrap(), OrderStatus::Packing)
                .await
                .unwrap();
            before.cancel(cancelled.id().unwrap(), owner).await.unwrap();
            (processing, packed, cancelled)
        };

        let after = engine(&journal, LifecycleConfig::default());
        assert!(after.timeline().is_empty().await);

        let recovered = after.recover().await.unwrap();
        assert_eq!(recovered, 2);
        assert_eq!(after.timeline().pending_for(processing.id().unwrap()).await.len(), 3);
        assert_eq!(after.timeline().pending_for(packed.id().unwrap()).await.len(), 2);
        assert!(after.timeline().pending_for(cancelled.id().unwrap()).await.is_empty());

        // Everything is overdue by now; the advances fire in status order.
        let much_later = chrono::Utc::now() + chrono::Duration::hours(1);
        assert_eq!(after.run_due(much_later).await, 5);
        assert_eq!(
            status_of(&journal, &after, processing.id().unwrap()).await,
            OrderStatus::Delivered
        );
        assert_eq!(
            status_of(&journal, &after, packed.id().unwrap()).await,
            OrderStatus::Delivered
        );
        assert_eq!(
            status_of(&journal, &after, cancelled.id().unwrap()).await,
            OrderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn recovery_ignores_carts() {
        let journal = InMemoryJournal::new();
        let carts = domain::CartService::new(
            journal.clone(),
            domain::InMemoryCatalog::new(),
            Timeouts::default(),
            domain::StaleEntryPolicy::Retain,
        );
        carts.add_item(UserId::new(), "p1".into(), 1).await.unwrap();

        let engine = engine(&journal, LifecycleConfig::default());
        assert_eq!(engine.recover().await.unwrap(), 0);
        assert!(engine.timeline().is_empty().await);
    }
}

mod stream {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_every_status_change() {
        let journal = InMemoryJournal::new();
        let engine = engine(&journal, LifecycleConfig::default());
        let service = orders(&journal, &engine);
        let owner = UserId::new();

        let mut changes = engine.subscribe();
        let order = place(&service, owner).await;
        let order_id = order.id().unwrap();
        engine.advance(order_id, OrderStatus::Packing).await.unwrap();
        engine.cancel(order_id, owner).await.unwrap();

        let seen: Vec<_> = (&mut changes)
            .take(3)
            .map(|change| (change.order_id, change.owner, change.from, change.to))
            .collect()
            .await;
        assert_eq!(
            seen,
            vec![
                (order_id, owner, None, OrderStatus::Processing),
                (order_id, owner, Some(OrderStatus::Processing), OrderStatus::Packing),
                (order_id, owner, Some(OrderStatus::Packing), OrderStatus::Cancelled),
            ]
        );
    }
}

mod worker {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn worker_delivers_and_stops_on_shutdown() {
        let journal = InMemoryJournal::new();
        let config = LifecycleConfig::default()
            .with_advance_interval(Duration::from_millis(20))
            .with_poll_interval(Duration::from_millis(5));
        let engine = engine(&journal, config);
        let service = orders(&journal, &engine);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = Arc::clone(&engine).spawn_worker(shutdown_rx);

        let order = place(&service, UserId::new()).await;
        let order_id = order.id().unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if status_of(&journal, &engine, order_id).await == OrderStatus::Delivered {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(delivered.is_ok());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        let records = journal.read_stream(order_id.stream_id()).await.unwrap();
        assert_eq!(records.len(), 4);
    }
}

mod races {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_racing_advances_leaves_order_cancelled() {
        for _ in 0..20 {
            let journal = InMemoryJournal::new();
            let engine = engine(&journal, LifecycleConfig::default());
            let service = orders(&journal, &engine);
            let owner = UserId::new();
            let order_id = place(&service, owner).await.id().unwrap();

            let advancing = {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    for target in OrderStatus::PROGRESSION {
                        let _ = engine.advance(order_id, target).await;
                    }
                })
            };
            let cancelling = {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.cancel(order_id, owner).await })
            };

            advancing.await.unwrap();
            let cancel_result = cancelling.await.unwrap();

            let final_status = status_of(&journal, &engine, order_id).await;
            match cancel_result {
                Ok(order) => {
                    assert_eq!(order.status(), OrderStatus::Cancelled);
                    assert_eq!(final_status, OrderStatus::Cancelled);
                }
                // The advances won: the order was delivered before the
                // cancellation was evaluated.
                Err(_) => assert_eq!(final_status, OrderStatus::Delivered),
            }

            // Nothing is written after a terminal status.
            let records = journal.read_stream(order_id.stream_id()).await.unwrap();
            let delivered = serde_json::json!("Delivered");
            let terminal_at = records
                .iter()
                .position(|r| r.record_type == "OrderCancelled")
                .or_else(|| {
                    records.iter().position(|r| {
                        r.payload.get("data").and_then(|d| d.get("to")) == Some(&delivered)
                    })
                })
                .unwrap();
            assert_eq!(terminal_at, records.len() - 1);
        }
    }
}

mod slow_notifications {
    use super::*;
    use async_trait::async_trait;
    use lifecycle::{Notification, NotificationSink, NotifyError};

    /// Sink whose deliveries never complete.
    struct StalledSink;

    #[async_trait]
    impl NotificationSink for StalledSink {
        async fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_sink_does_not_block_order_operations() {
        let journal = InMemoryJournal::new();
        let config = LifecycleConfig::default().with_notify_timeout(Duration::from_millis(50));
        let engine = Arc::new(LifecycleEngine::new(
            journal.clone(),
            StalledSink,
            config,
            Timeouts::default(),
        ));
        let service = OrderService::new(journal.clone(), Arc::clone(&engine), Timeouts::default());
        let owner = UserId::new();
        let item = || LineInput {
            product_id: ProductId::new("p1"),
            name: "Aurora Headphones".to_string(),
            unit_price: Money::from_cents(500),
            quantity: 1,
        };

        let placed = tokio::time::timeout(
            Duration::from_secs(2),
            service.create_from_items(owner, vec![item()], "Quezon City", "cod"),
        )
        .await
        .expect("placement finished")
        .unwrap();
        let order_id = placed.id().unwrap();

        let change = tokio::time::timeout(
            Duration::from_secs(2),
            engine.advance(order_id, OrderStatus::Packing),
        )
        .await
        .expect("advance finished")
        .unwrap();
        assert_eq!(change.map(|c| c.to), Some(OrderStatus::Packing));

        let other = service
            .create_from_items(owner, vec![item()], "Quezon City", "cod")
            .await
            .unwrap();
        let cancelled = tokio::time::timeout(
            Duration::from_secs(2),
            engine.cancel(other.id().unwrap(), owner),
        )
        .await
        .expect("cancel finished")
        .unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(journal.record_count().await, 4);
    }
}
