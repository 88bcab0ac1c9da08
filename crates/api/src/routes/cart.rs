//! Cart endpoints for the calling user.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Cart, CartLine, Money, ProductId};
use journal::Journal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveOrderedRequest {
    #[serde(alias = "itemIndexes")]
    pub indexes: Vec<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub item_count: usize,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub subtotal_cents: i64,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.product_id.to_string(),
            name: line.product.name.clone(),
            category: line.product.category.clone(),
            description: line.product.description.clone(),
            unit_price_cents: line.product.price.cents(),
            quantity: line.quantity,
            subtotal_cents: line.product.price.multiply(line.quantity).cents(),
        }
    }
}

/// The stored entries, as written; products are not resolved.
#[derive(Serialize)]
pub struct CartContentsResponse {
    pub items: Vec<CartItemResponse>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
}

impl From<&Cart> for CartContentsResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// GET /cart: the cart with current product details and prices.
#[tracing::instrument(skip(state))]
pub async fn read<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
) -> Result<Json<CartResponse>, ApiError> {
    let lines = state.carts.read(owner).await?;
    let total: Money = lines
        .iter()
        .map(|line| line.product.price.multiply(line.quantity))
        .sum();

    Ok(Json(CartResponse {
        items: lines.iter().map(CartLineResponse::from).collect(),
        item_count: lines.len(),
        total_cents: total.cents(),
    }))
}

/// POST /cart/items: add a product, or more of it.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartContentsResponse>, ApiError> {
    let product_id = parse_product_id(&req.product_id)?;
    let cart = state
        .carts
        .add_item(owner, product_id, req.quantity.unwrap_or(1))
        .await?;
    Ok(Json(CartContentsResponse::from(&cart)))
}

/// PUT /cart/items/{product_id}: set the quantity of a product in the cart.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartContentsResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state
        .carts
        .update_quantity(owner, product_id, req.quantity)
        .await?;
    Ok(Json(CartContentsResponse::from(&cart)))
}

/// DELETE /cart/items/{product_id}: remove a product from the cart.
#[tracing::instrument(skip(state))]
pub async fn remove_item<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Path(product_id): Path<String>,
) -> Result<Json<CartContentsResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state.carts.remove_item(owner, product_id).await?;
    Ok(Json(CartContentsResponse::from(&cart)))
}

/// POST /cart/remove-ordered: remove the entries at the given positions.
#[tracing::instrument(skip(state, req))]
pub async fn remove_ordered<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Json(req): Json<RemoveOrderedRequest>,
) -> Result<Json<CartContentsResponse>, ApiError> {
    // Negative indexes never match an entry.
    let indexes: BTreeSet<usize> = req
        .indexes
        .into_iter()
        .filter_map(|i| usize::try_from(i).ok())
        .collect();
    let cart = state.carts.remove_by_indexes(owner, indexes).await?;
    Ok(Json(CartContentsResponse::from(&cart)))
}

/// DELETE /cart: empty the cart.
#[tracing::instrument(skip(state))]
pub async fn clear<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
) -> Result<Json<CartContentsResponse>, ApiError> {
    let cart = state.carts.clear(owner).await?;
    Ok(Json(CartContentsResponse::from(&cart)))
}

fn parse_product_id(raw: &str) -> Result<ProductId, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("product_id is required".to_string()));
    }
    Ok(ProductId::new(trimmed))
}
