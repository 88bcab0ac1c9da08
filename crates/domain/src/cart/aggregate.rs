//! Cart aggregate implementation.

use std::collections::BTreeSet;

use journal::{StreamKind, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::value_objects::ProductId;

use super::{CartError, CartEvent};

/// Maximum number of distinct products in a cart.
pub const MAX_CART_ITEMS: usize = 30;

/// Maximum quantity of a single product in a cart.
pub const MAX_ITEM_QUANTITY: u32 = 30;

/// Coerces a requested quantity into `1..=MAX_ITEM_QUANTITY`.
pub fn coerce_quantity(requested: i64) -> u32 {
    // Bounded to 1..=30 so the cast cannot truncate.
    requested.clamp(1, i64::from(MAX_ITEM_QUANTITY)) as u32
}

/// A product in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Cart aggregate root.
///
/// One per user, stored in the stream whose id is the owner's id. Items keep
/// insertion order and are unique by product.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    version: Version,
    items: Vec<CartItem>,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn stream_kind() -> StreamKind {
        StreamKind::Cart
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::ItemAdded(data) => match self.position(&data.product_id) {
                Some(index) => self.items[index].quantity = data.quantity,
                None => self.items.push(CartItem {
                    product_id: data.product_id,
                    quantity: data.quantity,
                }),
            },
            CartEvent::QuantitySet(data) => {
                if let Some(index) = self.position(&data.product_id) {
                    self.items[index].quantity = data.quantity;
                }
            }
            CartEvent::ItemRemoved(data) => {
                self.items.retain(|item| item.product_id != data.product_id);
            }
            CartEvent::CartCleared => self.items.clear(),
        }
    }
}

// Query methods
impl Cart {
    /// Returns the items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns an item by product ID.
    pub fn get_item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Returns the number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the cart holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| &item.product_id == product_id)
    }
}

// Command methods (return events)
impl Cart {
    /// Adds a product, or increases its quantity if already present.
    ///
    /// The requested quantity is coerced into range first, and the resulting
    /// quantity is capped; any excess is dropped.
    pub fn add_item(
        &self,
        product_id: ProductId,
        requested: i64,
    ) -> Result<Vec<CartEvent>, CartError> {
        let quantity = coerce_quantity(requested);

        match self.get_item(&product_id) {
            Some(existing) => {
                let merged = (existing.quantity + quantity).min(MAX_ITEM_QUANTITY);
                if merged == existing.quantity {
                    return Ok(vec![]);
                }
                Ok(vec![CartEvent::quantity_set(product_id, merged)])
            }
            None if self.items.len() >= MAX_CART_ITEMS => Err(CartError::CartFull {
                capacity: MAX_CART_ITEMS,
            }),
            None => Ok(vec![CartEvent::item_added(product_id, quantity)]),
        }
    }

    /// Sets the quantity of a product already in the cart.
    ///
    /// Absent products are ignored.
    pub fn update_quantity(
        &self,
        product_id: ProductId,
        requested: i64,
    ) -> Result<Vec<CartEvent>, CartError> {
        let quantity = coerce_quantity(requested);

        match self.get_item(&product_id) {
            Some(existing) if existing.quantity != quantity => {
                Ok(vec![CartEvent::quantity_set(product_id, quantity)])
            }
            _ => Ok(vec![]),
        }
    }

    /// Removes a product. Removing an absent product does nothing.
    pub fn remove_item(&self, product_id: ProductId) -> Result<Vec<CartEvent>, CartError> {
        if self.get_item(&product_id).is_none() {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::item_removed(product_id)])
    }

    /// Removes the entries at the given positions. Out-of-range positions are
    /// ignored.
    pub fn remove_by_indexes(
        &self,
        indexes: &BTreeSet<usize>,
    ) -> Result<Vec<CartEvent>, CartError> {
        Ok(indexes
            .iter()
            .filter_map(|&index| self.items.get(index))
            .map(|item| CartEvent::item_removed(item.product_id.clone()))
            .collect())
    }

    /// Removes every listed product that is in the cart.
    pub fn remove_products(&self, product_ids: &[ProductId]) -> Result<Vec<CartEvent>, CartError> {
        let mut seen = BTreeSet::new();
        Ok(product_ids
            .iter()
            .filter(|id| self.get_item(id).is_some() && seen.insert(*id))
            .map(|id| CartEvent::item_removed(id.clone()))
            .collect())
    }

    /// Empties the cart.
    pub fn clear(&self) -> Result<Vec<CartEvent>, CartError> {
        if self.items.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![CartEvent::CartCleared])
    }
}
