//! Order placement, cancellation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{LineInput, Money, Order, OrderId, OrderLine, ProductId, SessionCart, StoredCart};
use journal::Journal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<LineRequest>,
    pub shipping_address: String,
    pub payment_method: String,
}

/// Checkout request.
///
/// With `items`, the caller holds the cart (e.g. in its session) and the
/// lines are taken as given. Without, the caller's stored cart is checked
/// out at current catalog prices.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub payment_method: String,
    #[serde(default)]
    pub items: Option<Vec<LineRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub items: Vec<OrderLineResponse>,
    pub total_cents: i64,
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub subtotal_cents: i64,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            product_name: line.product_name.clone(),
            unit_price_cents: line.unit_price.cents(),
            quantity: line.quantity,
            subtotal_cents: line.subtotal().cents(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()).unwrap_or_default(),
            status: order.status().to_string(),
            items: order.lines().iter().map(OrderLineResponse::from).collect(),
            total_cents: order.total().cents(),
            shipping_address: order.shipping_address().to_string(),
            payment_method: order.payment_method().map(|m| m.to_string()),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders: place an order from caller-priced items.
#[tracing::instrument(skip(state, req))]
pub async fn create<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let items = to_line_inputs(req.items)?;
    let order = state
        .orders
        .create_from_items(owner, items, &req.shipping_address, &req.payment_method)
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// POST /orders/from-cart: check out a cart.
#[tracing::instrument(skip(state, req))]
pub async fn create_from_cart<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = match req.items {
        Some(items) => {
            let cart = SessionCart::with_lines(to_line_inputs(items)?);
            state
                .orders
                .create_from_cart(owner, &cart, &req.shipping_address, &req.payment_method)
                .await?
        }
        None => {
            let cart = StoredCart::new(&state.carts, owner);
            state
                .orders
                .create_from_cart(owner, &cart, &req.shipping_address, &req.payment_method)
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// POST /orders/{id}/cancel: cancel one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn cancel<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.cancel(order_id, owner).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders?status=: the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .queries
        .list_for_owner(owner, query.status.as_deref())
        .await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
    Identity(owner): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.queries.get_for_owner(order_id, owner).await?;
    Ok(Json(OrderResponse::from(&order)))
}

fn to_line_inputs(items: Vec<LineRequest>) -> Result<Vec<LineInput>, ApiError> {
    items
        .into_iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                ApiError::BadRequest(format!(
                    "Invalid quantity for {}: {}",
                    item.product_id, item.quantity
                ))
            })?;
            Ok(LineInput {
                product_id: ProductId::new(item.product_id.trim()),
                name: item.name,
                unit_price: Money::from_cents(item.unit_price_cents),
                quantity,
            })
        })
        .collect()
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
