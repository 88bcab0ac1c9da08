//! Catalog gateway.
//!
//! The catalog lives outside this system. Carts hold product ids only and
//! resolve names and prices through this trait at read and checkout time.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::error::DomainError;
use crate::value_objects::{Money, ProductId};

/// Product details as the catalog currently knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub description: String,
}

/// Errors returned by a catalog lookup.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The product does not exist (any more).
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The catalog could not be reached.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Product lookup.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolves a product id to its current details.
    async fn resolve(&self, product_id: &ProductId) -> Result<ProductDetails, CatalogError>;
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    async fn resolve(&self, product_id: &ProductId) -> Result<ProductDetails, CatalogError> {
        (**self).resolve(product_id).await
    }
}

/// Resolves a product within `timeout`.
///
/// Returns `Ok(None)` when the product does not exist; an unreachable or
/// slow catalog is an error.
pub async fn resolve_within<C: Catalog + ?Sized>(
    catalog: &C,
    product_id: &ProductId,
    timeout: Duration,
) -> Result<Option<ProductDetails>, DomainError> {
    match tokio::time::timeout(timeout, catalog.resolve(product_id)).await {
        Ok(Ok(details)) => Ok(Some(details)),
        Ok(Err(CatalogError::NotFound(_))) => Ok(None),
        Ok(Err(CatalogError::Unavailable(reason))) => Err(DomainError::CatalogUnavailable(reason)),
        Err(_) => Err(DomainError::Timeout {
            operation: "catalog lookup",
            after: timeout,
        }),
    }
}

/// In-memory catalog.
///
/// Backs the api binary (seeded with demo products) and the tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, ProductDetails>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the given products.
    pub fn with_products(products: impl IntoIterator<Item = ProductDetails>) -> Self {
        let map = products
            .into_iter()
            .map(|p| (p.product_id.clone(), p))
            .collect();
        Self {
            products: Arc::new(RwLock::new(map)),
            unavailable: Arc::default(),
        }
    }

    /// Inserts or replaces a product.
    pub async fn upsert(&self, product: ProductDetails) {
        self.products
            .write()
            .await
            .insert(product.product_id.clone(), product);
    }

    /// Removes a product, returning it if it existed.
    pub async fn remove(&self, product_id: &ProductId) -> Option<ProductDetails> {
        self.products.write().await.remove(product_id)
    }

    /// Returns all products ordered by id.
    pub async fn products(&self) -> Vec<ProductDetails> {
        let mut products: Vec<_> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        products
    }

    /// Makes every lookup fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn resolve(&self, product_id: &ProductId) -> Result<ProductDetails, CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable(
                "in-memory catalog switched off".to_string(),
            ));
        }

        self.products
            .read()
            .await
            .get(product_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(product_id.clone()))
    }
}
