//! Value objects for the order domain.

use std::str::FromStr;

use common::StreamId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{Money, ProductId};

/// Unique identifier for an order. Also the id of the order's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the id of the journal stream holding this order.
    pub fn stream_id(&self) -> StreamId {
        StreamId::from_uuid(self.0)
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StreamId> for OrderId {
    fn from(id: StreamId) -> Self {
        Self(id.as_uuid())
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    Gcash,
    Maya,
    /// Bank transfer.
    Bank,
}

impl PaymentMethod {
    /// Returns the method as sent by clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Maya => "maya",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "gcash" => Ok(PaymentMethod::Gcash),
            "maya" => Ok(PaymentMethod::Maya),
            "bank" => Ok(PaymentMethod::Bank),
            other => Err(format!("unsupported payment method: {other:?}")),
        }
    }
}

/// An item handed to order creation, already priced by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A line of a placed order.
///
/// Name and price are copied at placement and never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    /// Returns quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

impl From<LineInput> for OrderLine {
    fn from(input: LineInput) -> Self {
        Self {
            product_id: input.product_id,
            product_name: input.name,
            unit_price: input.unit_price,
            quantity: input.quantity,
        }
    }
}
