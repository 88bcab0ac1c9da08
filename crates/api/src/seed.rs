//! Demo catalog loaded when the server starts.

use domain::{InMemoryCatalog, Money, ProductDetails, ProductId};

const DEMO_PRODUCTS: &[(&str, &str, &str, i64, &str)] = &[
    (
        "elec-001",
        "Nimbus Wireless Keyboard",
        "Electronics",
        249_900,
        "Low-profile keyboard with three Bluetooth channels.",
    ),
    (
        "elec-002",
        "Aurora Noise-Cancelling Headphones",
        "Electronics",
        599_000,
        "Over-ear headphones with 30 hours of battery life.",
    ),
    (
        "gadg-001",
        "Pocket Power Bank 10000mAh",
        "Gadgets",
        115_000,
        "Slim power bank with USB-C fast charging.",
    ),
    (
        "gadg-002",
        "Smart Plug Mini",
        "Gadgets",
        69_900,
        "Wi-Fi plug with schedules and energy monitoring.",
    ),
    ("food-001", "Dried Mango Pack", "Foods", 18_900, "Sweet dried mangoes from Cebu, 200 g."),
    ("food-002", "Barako Coffee Beans", "Foods", 42_000, "Whole-bean Batangas coffee, 500 g."),
    (
        "fash-001",
        "Canvas Tote Bag",
        "Fashion",
        35_000,
        "Sturdy everyday tote with an inner pocket.",
    ),
    ("fash-002", "Linen Button-Down Shirt", "Fashion", 129_900, "Breathable shirt for warm days."),
    ("home-001", "Rattan Storage Basket", "Home", 79_900, "Handwoven basket with a lid."),
    ("home-002", "Ceramic Pour-Over Set", "Home", 149_900, "Dripper, carafe and two cups."),
];

/// Returns a catalog holding the demo products.
pub fn demo_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products(DEMO_PRODUCTS.iter().map(
        |&(id, name, category, cents, description)| ProductDetails {
            product_id: ProductId::new(id),
            name: name.to_string(),
            price: Money::from_cents(cents),
            category: category.to_string(),
            description: description.to_string(),
        },
    ))
}
