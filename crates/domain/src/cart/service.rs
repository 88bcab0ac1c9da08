//! Cart service providing the per-user cart operations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use common::UserId;
use journal::Journal;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::catalog::{Catalog, ProductDetails, resolve_within};
use crate::command::CommandHandler;
use crate::config::{StaleEntryPolicy, Timeouts};
use crate::error::DomainError;
use crate::value_objects::ProductId;

use super::{Cart, CartError, CartEvent, CartItem};

/// A cart entry with its product resolved through the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product: ProductDetails,
    pub quantity: u32,
}

/// One async mutex per owner.
///
/// Serializes read-modify-write cycles on a cart inside this process; the
/// journal's expected-version check covers writers in other processes.
#[derive(Default)]
struct OwnerLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl OwnerLocks {
    async fn acquire(&self, owner: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(owner).or_default())
        };
        lock.lock_owned().await
    }
}

/// Service for managing carts.
///
/// Every mutation for one owner runs under that owner's lock, so concurrent
/// requests from several tabs apply one after another.
pub struct CartService<J: Journal, C: Catalog> {
    handler: CommandHandler<J, Cart>,
    catalog: C,
    locks: OwnerLocks,
    timeouts: Timeouts,
    stale_entries: StaleEntryPolicy,
}

impl<J: Journal, C: Catalog> CartService<J, C> {
    /// Creates a new cart service.
    pub fn new(
        journal: J,
        catalog: C,
        timeouts: Timeouts,
        stale_entries: StaleEntryPolicy,
    ) -> Self {
        Self {
            handler: CommandHandler::new(journal, timeouts.journal),
            catalog,
            locks: OwnerLocks::default(),
            timeouts,
            stale_entries,
        }
    }

    /// Returns the catalog used to resolve entries.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub(crate) fn catalog_timeout(&self) -> std::time::Duration {
        self.timeouts.catalog
    }

    /// Adds a product, or increases its quantity if already present.
    ///
    /// The product is not looked up; unknown products are filtered at read
    /// time.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        owner: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, DomainError> {
        self.mutate(owner, "add", |cart| cart.add_item(product_id, quantity)).await
    }

    /// Sets the quantity of a product; does nothing if it is not in the cart.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        owner: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, DomainError> {
        self.mutate(owner, "update", |cart| {
            cart.update_quantity(product_id, quantity)
        })
        .await
    }

    /// Removes a product from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        owner: UserId,
        product_id: ProductId,
    ) -> Result<Cart, DomainError> {
        self.mutate(owner, "remove", |cart| cart.remove_item(product_id)).await
    }

    /// Removes the entries at the given positions of the current cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_by_indexes(
        &self,
        owner: UserId,
        indexes: BTreeSet<usize>,
    ) -> Result<Cart, DomainError> {
        self.mutate(owner, "remove_many", |cart| cart.remove_by_indexes(&indexes)).await
    }

    /// Removes the listed products from the cart.
    #[tracing::instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    pub async fn remove_products(
        &self,
        owner: UserId,
        product_ids: &[ProductId],
    ) -> Result<Cart, DomainError> {
        self.mutate(owner, "remove_products", |cart| {
            cart.remove_products(product_ids)
        })
        .await
    }

    /// Empties the cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, owner: UserId) -> Result<Cart, DomainError> {
        self.mutate(owner, "clear", |cart| cart.clear()).await
    }

    /// Returns the raw entries, without catalog lookups.
    pub async fn items(&self, owner: UserId) -> Result<Vec<CartItem>, DomainError> {
        let cart = self.handler.load(owner.into()).await?;
        Ok(cart.items().to_vec())
    }

    /// Returns the cart with every entry resolved through the catalog.
    ///
    /// Entries whose product no longer exists are left out; with
    /// `StaleEntryPolicy::Purge` they are also removed from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, owner: UserId) -> Result<Vec<CartLine>, DomainError> {
        let cart = self.handler.load(owner.into()).await?;

        let mut lines = Vec::with_capacity(cart.len());
        let mut stale = Vec::new();
        for item in cart.items() {
            match resolve_within(&self.catalog, &item.product_id, self.timeouts.catalog).await? {
                Some(product) => lines.push(CartLine {
                    product,
                    quantity: item.quantity,
                }),
                None => stale.push(item.product_id.clone()),
            }
        }

        if !stale.is_empty() {
            tracing::debug!(
                %owner,
                stale = stale.len(),
                "cart holds products missing from the catalog"
            );
            if self.stale_entries == StaleEntryPolicy::Purge {
                self.remove_products(owner, &stale).await?;
            }
        }

        Ok(lines)
    }

    async fn mutate<F>(
        &self,
        owner: UserId,
        operation: &'static str,
        command_fn: F,
    ) -> Result<Cart, DomainError>
    where
        F: FnOnce(&Cart) -> Result<Vec<CartEvent>, CartError>,
    {
        let _guard = self.locks.acquire(owner).await;

        let result = self
            .handler
            .execute(owner.into(), Some(owner), command_fn)
            .await?;

        if !result.events.is_empty() {
            metrics::counter!("cart_mutations_total", "operation" => operation).increment(1);
            tracing::debug!(%owner, operation, version = %result.new_version, "cart updated");
        }

        Ok(result.aggregate)
    }
}
