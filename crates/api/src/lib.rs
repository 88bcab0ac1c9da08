//! HTTP surface of the storefront.
//!
//! Exposes the cart, checkout and order endpoints for the user named in the
//! `x-user-id` header, plus health and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod seed;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use journal::Journal;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<J: Journal + 'static>(
    state: Arc<AppState<J>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{cart, orders, products};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(products::list::<J>))
        .route("/cart", get(cart::read::<J>).delete(cart::clear::<J>))
        .route("/cart/items", post(cart::add_item::<J>))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_item::<J>).delete(cart::remove_item::<J>),
        )
        .route("/cart/remove-ordered", post(cart::remove_ordered::<J>))
        .route("/orders", post(orders::create::<J>).get(orders::list::<J>))
        .route("/orders/from-cart", post(orders::create_from_cart::<J>))
        .route("/orders/{id}", get(orders::get::<J>))
        .route("/orders/{id}/cancel", post(orders::cancel::<J>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
