//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request carries no usable identity.
    #[error("{0}")]
    Unauthorized(String),
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => domain_status(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Order(OrderError::Validation { .. })
        | DomainError::Order(OrderError::EmptyCart)
        | DomainError::Order(OrderError::AlreadyPlaced)
        | DomainError::Cart(CartError::CartFull { .. }) => StatusCode::BAD_REQUEST,
        DomainError::Order(OrderError::NotFound) | DomainError::NotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        DomainError::Order(OrderError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        err if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OrderStatus;
    use std::time::Duration;

    #[test]
    fn test_domain_status_mapping() {
        let cases = [
            (
                DomainError::Order(OrderError::Validation {
                    field: "shipping_address",
                    reason: "must not be blank".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Cart(CartError::CartFull { capacity: 30 }),
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::Order(OrderError::EmptyCart), StatusCode::BAD_REQUEST),
            (DomainError::not_found("Order", "x"), StatusCode::NOT_FOUND),
            (
                DomainError::Order(OrderError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Cancelled,
                }),
                StatusCode::CONFLICT,
            ),
            (
                DomainError::Timeout {
                    operation: "journal read",
                    after: Duration::from_millis(5),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                DomainError::CatalogUnavailable("down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(domain_status(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_unauthorized_response() {
        let response =
            ApiError::Unauthorized("missing x-user-id header".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
