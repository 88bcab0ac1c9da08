//! Catalog listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::ProductDetails;
use journal::Journal;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_cents: i64,
}

impl From<ProductDetails> for ProductResponse {
    fn from(product: ProductDetails) -> Self {
        Self {
            product_id: product.product_id.to_string(),
            name: product.name,
            category: product.category,
            description: product.description,
            price_cents: product.price.cents(),
        }
    }
}

/// GET /products: every product in the catalog.
pub async fn list<J: Journal + 'static>(
    State(state): State<Arc<AppState<J>>>,
) -> Json<Vec<ProductResponse>> {
    let products = state.carts.catalog().products().await;
    Json(products.into_iter().map(ProductResponse::from).collect())
}
