//! Domain layer of the storefront.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for journal-backed entities
//! - CommandHandler for bounded, version-checked command execution
//! - The per-user Cart aggregate and CartService
//! - The Order aggregate with its status state machine and OrderService
//! - The Catalog gateway used to price cart entries

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod order;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent};
pub use cart::{
    Cart, CartError, CartEvent, CartItem, CartLine, CartService, CheckoutSource, MAX_CART_ITEMS,
    MAX_ITEM_QUANTITY, SessionCart, StoredCart,
};
pub use catalog::{Catalog, CatalogError, InMemoryCatalog, ProductDetails};
pub use command::{CommandHandler, CommandResult};
pub use config::{StaleEntryPolicy, Timeouts};
pub use error::DomainError;
pub use order::{
    LineInput, NoopRegistrar, Order, OrderError, OrderEvent, OrderId, OrderLine, OrderRegistrar,
    OrderService, OrderStatus, PaymentMethod,
};
pub use value_objects::{Money, ProductId};
