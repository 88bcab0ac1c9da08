//! Cart domain events.
//!
//! Quantities are recorded as absolute values so replaying a stream never
//! depends on the order increments were observed in.

use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::ProductId;

/// Events that can occur on a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// A product not yet in the cart was added.
    ItemAdded(ItemAddedData),

    /// The quantity of a product already in the cart changed.
    QuantitySet(QuantitySetData),

    /// A product was removed.
    ItemRemoved(ItemRemovedData),

    /// Every product was removed.
    CartCleared,
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ItemAdded(_) => "ItemAdded",
            CartEvent::QuantitySet(_) => "QuantitySet",
            CartEvent::ItemRemoved(_) => "ItemRemoved",
            CartEvent::CartCleared => "CartCleared",
        }
    }
}

/// Data for ItemAdded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAddedData {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Data for QuantitySet event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantitySetData {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Data for ItemRemoved event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemovedData {
    pub product_id: ProductId,
}

impl CartEvent {
    pub(crate) fn item_added(product_id: ProductId, quantity: u32) -> Self {
        CartEvent::ItemAdded(ItemAddedData {
            product_id,
            quantity,
        })
    }

    pub(crate) fn quantity_set(product_id: ProductId, quantity: u32) -> Self {
        CartEvent::QuantitySet(QuantitySetData {
            product_id,
            quantity,
        })
    }

    pub(crate) fn item_removed(product_id: ProductId) -> Self {
        CartEvent::ItemRemoved(ItemRemovedData { product_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        assert_eq!(
            CartEvent::item_added(ProductId::new("p1"), 1).event_type(),
            "ItemAdded"
        );
        assert_eq!(
            CartEvent::quantity_set(ProductId::new("p1"), 2).event_type(),
            "QuantitySet"
        );
        assert_eq!(
            CartEvent::item_removed(ProductId::new("p1")).event_type(),
            "ItemRemoved"
        );
        assert_eq!(CartEvent::CartCleared.event_type(), "CartCleared");
    }

    #[test]
    fn test_event_payload_shape() {
        let json = serde_json::to_value(CartEvent::quantity_set(ProductId::new("p1"), 7)).unwrap();
        assert_eq!(json["type"], "QuantitySet");
        assert_eq!(json["data"]["product_id"], "p1");
        assert_eq!(json["data"]["quantity"], 7);

        let back: CartEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, CartEvent::quantity_set(ProductId::new("p1"), 7));
    }
}
