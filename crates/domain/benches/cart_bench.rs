use common::UserId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CartService, InMemoryCatalog, LineInput, Money, NoopRegistrar, OrderService, ProductDetails,
    ProductId, StaleEntryPolicy, StoredCart, Timeouts,
};
use journal::InMemoryJournal;

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products((0..30).map(|i| ProductDetails {
        product_id: ProductId::new(format!("p{i}")),
        name: format!("Product {i}"),
        price: Money::from_cents(100 * (i + 1)),
        category: "Bench".to_string(),
        description: String::new(),
    }))
}

fn cart_service(journal: InMemoryJournal) -> CartService<InMemoryJournal, InMemoryCatalog> {
    CartService::new(
        journal,
        catalog(),
        Timeouts::default(),
        StaleEntryPolicy::Retain,
    )
}

fn bench_add_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = cart_service(InMemoryJournal::new());
    let owner = UserId::new();

    c.bench_function("cart/add_item_existing", |b| {
        b.iter(|| {
            rt.block_on(async {
                // Toggle between two quantities so every call writes a record.
                service.update_quantity(owner, "p0".into(), 1).await.ok();
                service.add_item(owner, "p0".into(), 1).await.unwrap();
            });
        });
    });
}

fn bench_read_full_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = cart_service(InMemoryJournal::new());
    let owner = UserId::new();

    rt.block_on(async {
        for i in 0..30 {
            service
                .add_item(owner, format!("p{i}").into(), 2)
                .await
                .unwrap();
        }
    });

    c.bench_function("cart/read_30_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.read(owner).await.unwrap();
            });
        });
    });
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cart/checkout_5_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                let journal = InMemoryJournal::new();
                let carts = cart_service(journal.clone());
                let orders = OrderService::new(journal, NoopRegistrar, Timeouts::default());
                let owner = UserId::new();
                for i in 0..5 {
                    carts
                        .add_item(owner, format!("p{i}").into(), 1)
                        .await
                        .unwrap();
                }

                let cart = StoredCart::new(&carts, owner);
                orders
                    .create_from_cart(owner, &cart, "Bench Street", "cod")
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_create_from_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orders = OrderService::new(InMemoryJournal::new(), NoopRegistrar, Timeouts::default());
    let items: Vec<LineInput> = (0..10)
        .map(|i| LineInput {
            product_id: ProductId::new(format!("p{i}")),
            name: format!("Product {i}"),
            unit_price: Money::from_cents(250),
            quantity: 2,
        })
        .collect();

    c.bench_function("order/create_from_10_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                orders
                    .create_from_items(UserId::new(), items.clone(), "Bench Street", "bank")
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_add_item,
    bench_read_full_cart,
    bench_checkout,
    bench_create_from_items,
);
criterion_main!(benches);
