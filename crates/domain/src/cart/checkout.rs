//! Carts as seen by checkout.

use async_trait::async_trait;
use common::UserId;
use journal::Journal;
use tokio::sync::Mutex;

use crate::catalog::{Catalog, resolve_within};
use crate::error::DomainError;
use crate::order::LineInput;
use crate::value_objects::ProductId;

use super::CartService;

/// A cart an order can be created from.
#[async_trait]
pub trait CheckoutSource: Send + Sync {
    /// Returns the lines to freeze into the order, with current names and
    /// prices.
    async fn checkout_lines(&self) -> Result<Vec<LineInput>, DomainError>;

    /// Removes the ordered lines from the cart.
    async fn clear(&self, ordered: &[LineInput]) -> Result<(), DomainError>;
}

/// A cart held by the caller, e.g. in a login session.
///
/// Lines already carry their name and price.
#[derive(Debug, Default)]
pub struct SessionCart {
    lines: Mutex<Vec<LineInput>>,
}

impl SessionCart {
    /// Creates an empty session cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session cart holding the given lines.
    pub fn with_lines(lines: Vec<LineInput>) -> Self {
        Self {
            lines: Mutex::new(lines),
        }
    }

    /// Appends a line.
    pub async fn push(&self, line: LineInput) {
        self.lines.lock().await.push(line);
    }

    /// Returns the current lines.
    pub async fn lines(&self) -> Vec<LineInput> {
        self.lines.lock().await.clone()
    }
}

#[async_trait]
impl CheckoutSource for SessionCart {
    async fn checkout_lines(&self) -> Result<Vec<LineInput>, DomainError> {
        Ok(self.lines().await)
    }

    async fn clear(&self, _ordered: &[LineInput]) -> Result<(), DomainError> {
        self.lines.lock().await.clear();
        Ok(())
    }
}

/// The owner's persisted cart, priced through the catalog at checkout.
///
/// Clearing removes only the ordered products, so anything added while the
/// order was being placed stays in the cart.
pub struct StoredCart<'a, J: Journal, C: Catalog> {
    service: &'a CartService<J, C>,
    owner: UserId,
}

impl<'a, J: Journal, C: Catalog> StoredCart<'a, J, C> {
    /// Creates a checkout view over `owner`'s cart.
    pub fn new(service: &'a CartService<J, C>, owner: UserId) -> Self {
        Self { service, owner }
    }
}

#[async_trait]
impl<'a, J: Journal, C: Catalog> CheckoutSource for StoredCart<'a, J, C> {
    async fn checkout_lines(&self) -> Result<Vec<LineInput>, DomainError> {
        let items = self.service.items(self.owner).await?;
        let timeout = self.service.catalog_timeout();

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            match resolve_within(self.service.catalog(), &item.product_id, timeout).await? {
                Some(product) => lines.push(LineInput {
                    product_id: product.product_id,
                    name: product.name,
                    unit_price: product.price,
                    quantity: item.quantity,
                }),
                None => {
                    tracing::debug!(
                        owner = %self.owner,
                        product_id = %item.product_id,
                        "skipping product missing from the catalog"
                    );
                }
            }
        }

        Ok(lines)
    }

    async fn clear(&self, ordered: &[LineInput]) -> Result<(), DomainError> {
        let product_ids: Vec<ProductId> = ordered.iter().map(|l| l.product_id.clone()).collect();
        self.service.remove_products(self.owner, &product_ids).await?;
        Ok(())
    }
}
