//! Integration tests for order placement.
//!
//! These tests cover checkout from the persisted cart, price snapshots,
//! aggregate reconstruction from the journal, and concurrent status writes.

use common::UserId;
use domain::{
    Aggregate, CartService, CheckoutSource, CommandHandler, DomainError, DomainEvent,
    InMemoryCatalog, LineInput, Money, NoopRegistrar, Order, OrderError, OrderEvent, OrderService,
    OrderStatus, ProductDetails, ProductId, StaleEntryPolicy, StoredCart, Timeouts,
};
use journal::{InMemoryJournal, Journal, JournalError, StreamKind, Version};

fn product(id: &str, name: &str, cents: i64) -> ProductDetails {
    ProductDetails {
        product_id: ProductId::new(id),
        name: name.to_string(),
        price: Money::from_cents(cents),
        category: "Peripherals".to_string(),
        description: String::new(),
    }
}

fn line(id: &str, cents: i64, quantity: u32) -> LineInput {
    LineInput {
        product_id: ProductId::new(id),
        name: format!("Product {id}"),
        unit_price: Money::from_cents(cents),
        quantity,
    }
}

struct Shop {
    journal: InMemoryJournal,
    catalog: InMemoryCatalog,
    carts: CartService<InMemoryJournal, InMemoryCatalog>,
    orders: OrderService<InMemoryJournal, NoopRegistrar>,
}

fn create_shop() -> Shop {
    let journal = InMemoryJournal::new();
    let catalog = InMemoryCatalog::with_products([
        product("p1", "Nimbus Keyboard", 1000),
        product("p2", "Aurora Headphones", 500),
    ]);
    Shop {
        carts: CartService::new(
            journal.clone(),
            catalog.clone(),
            Timeouts::default(),
            StaleEntryPolicy::Retain,
        ),
        orders: OrderService::new(journal.clone(), NoopRegistrar, Timeouts::default()),
        journal,
        catalog,
    }
}

mod checkout {
    use super::*;

    #[tokio::test]
    async fn stored_cart_becomes_processing_order_and_empties() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "p1".into(), 2).await.unwrap();
        shop.carts.add_item(owner, "p2".into(), 1).await.unwrap();

        let cart = StoredCart::new(&shop.carts, owner);
        let order = shop
            .orders
            .create_from_cart(owner, &cart, "12 Mabini St, Quezon City", "cod")
            .await
            .unwrap();

        assert_eq!(order.total(), Money::from_cents(2500));
        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.lines()[0].product_name, "Nimbus Keyboard");
        assert!(shop.carts.items(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_stored_cart_is_rejected() {
        let shop = create_shop();
        let owner = UserId::new();

        let cart = StoredCart::new(&shop.carts, owner);
        let result = shop
            .orders
            .create_from_cart(owner, &cart, "Manila", "bank")
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::EmptyCart))
        ));
        assert_eq!(shop.journal.record_count().await, 0);
    }

    #[tokio::test]
    async fn cart_of_only_missing_products_is_empty() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "retired".into(), 1).await.unwrap();

        let cart = StoredCart::new(&shop.carts, owner);
        let result = shop
            .orders
            .create_from_cart(owner, &cart, "Manila", "cod")
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn checkout_with_unavailable_catalog_is_transient() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "p1".into(), 1).await.unwrap();
        shop.catalog.set_unavailable(true);

        let cart = StoredCart::new(&shop.carts, owner);
        let err = shop
            .orders
            .create_from_cart(owner, &cart, "Manila", "cod")
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(shop.carts.items(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stored_checkout_keeps_entries_that_were_not_ordered() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "p1".into(), 1).await.unwrap();
        shop.carts.add_item(owner, "retired".into(), 2).await.unwrap();

        let cart = StoredCart::new(&shop.carts, owner);
        let order = shop
            .orders
            .create_from_cart(owner, &cart, "Manila", "cod")
            .await
            .unwrap();

        assert_eq!(order.lines().len(), 1);
        let left = shop.carts.items(owner).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].product_id, ProductId::new("retired"));
    }

    #[tokio::test]
    async fn price_changes_after_placement_do_not_touch_the_order() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "p1".into(), 1).await.unwrap();

        let cart = StoredCart::new(&shop.carts, owner);
        let order = shop
            .orders
            .create_from_cart(owner, &cart, "Manila", "gcash")
            .await
            .unwrap();

        shop.catalog
            .upsert(product("p1", "Nimbus Keyboard v2", 99_999))
            .await;

        let reloaded = shop
            .orders
            .get_order(order.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.total(), Money::from_cents(1000));
        assert_eq!(reloaded.lines()[0].product_name, "Nimbus Keyboard");
    }

    #[tokio::test]
    async fn checkout_source_can_be_used_as_trait_object() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "p2".into(), 3).await.unwrap();

        let stored = StoredCart::new(&shop.carts, owner);
        let source: &dyn CheckoutSource = &stored;
        let order = shop
            .orders
            .create_from_cart(owner, source, "Baguio City", "maya")
            .await
            .unwrap();

        assert_eq!(order.total(), Money::from_cents(1500));
    }
}

mod reconstruction {
    use super::*;

    #[tokio::test]
    async fn order_is_rebuilt_from_its_records() {
        let shop = create_shop();
        let owner = UserId::new();

        let placed = shop
            .orders
            .create_from_items(owner, vec![line("p1", 999, 3)], "Manila", "cod")
            .await
            .unwrap();
        let order_id = placed.id().unwrap();

        let records = shop.journal.read_stream(order_id.stream_id()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stream_kind, StreamKind::Order);
        assert_eq!(records[0].owner, owner);
        assert_eq!(records[0].record_type, "OrderPlaced");

        let order = shop.orders.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.id(), Some(order_id));
        assert_eq!(order.version(), Version::first());
        assert_eq!(order.total().cents(), 2997);
        assert_eq!(order.lines()[0].quantity, 3);
    }

    #[tokio::test]
    async fn cart_stream_is_not_an_order() {
        let shop = create_shop();
        let owner = UserId::new();
        shop.carts.add_item(owner, "p1".into(), 1).await.unwrap();

        // The cart lives in the stream named after the owner.
        let as_order = shop
            .orders
            .get_order(domain::OrderId::from_uuid(owner.as_uuid()))
            .await
            .unwrap();
        assert!(as_order.is_none());
    }
}

mod concurrency {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn stale_status_write_is_detected() {
        let shop = create_shop();
        let owner = UserId::new();
        let order = shop
            .orders
            .create_from_items(owner, vec![line("p1", 100, 1)], "Manila", "cod")
            .await
            .unwrap();
        let stream = order.id().unwrap().stream_id();

        let handler: CommandHandler<_, Order> =
            CommandHandler::new(shop.journal.clone(), Duration::from_secs(1));

        // Both writers observed version 1.
        let stale = handler.load(stream).await.unwrap();
        handler
            .execute(stream, None, |order| order.cancel(owner, Utc::now()))
            .await
            .unwrap();

        let events = stale.advance_to(OrderStatus::Packing, Utc::now()).unwrap();
        let record = journal::Record::builder()
            .stream_id(stream)
            .stream_kind(StreamKind::Order)
            .owner(owner)
            .record_type(events[0].event_type())
            .version(stale.version().next())
            .payload(&events[0])
            .unwrap()
            .build()
            .unwrap();
        let result = shop
            .journal
            .append(
                vec![record],
                journal::AppendOptions::expect_version(stale.version()),
            )
            .await;

        assert!(matches!(
            result,
            Err(JournalError::ConcurrencyConflict { .. })
        ));

        let current = handler.load(stream).await.unwrap();
        assert_eq!(current.status(), OrderStatus::Cancelled);
        assert!(matches!(
            current.advance_to(OrderStatus::Packing, Utc::now()),
            Ok(events) if events.is_empty()
        ));
        assert!(matches!(events[0], OrderEvent::StatusAdvanced(_)));
    }
}
