//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! The propagation policy: anything that could corrupt or lose the user's
//! cart is prevented locally (defensive defaults, malformed stored data never
//! throws); anything that would create an inconsistent financial record is
//! fail-fast and atomic, surfaced here as a checkout failure.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use swiftcart_core::cart::CartError;

use crate::catalog::CatalogError;
use crate::db::RepositoryError;
use crate::services::identity::IdentityError;
use crate::services::images::ImageHostError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Catalog lookup failed outside the order path (where it has no fallback).
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Image host operation failed.
    #[error("Image host error: {0}")]
    ImageHost(#[from] ImageHostError),

    /// Malformed cart mutation input.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the required capability (e.g. seller).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_)
            | Self::Catalog(_)
            | Self::Internal(_)
            | Self::Order(OrderError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Identity(_) | Self::ImageHost(_) => StatusCode::BAD_GATEWAY,
            Self::Cart(CartError::InvalidItem(_))
            | Self::Order(OrderError::MissingAddress | OrderError::InvalidInput(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Order(OrderError::Unauthenticated) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Client-safe message; internal details stay in logs and Sentry.
    fn message(&self) -> String {
        match self {
            Self::Database(_)
            | Self::Catalog(_)
            | Self::Internal(_)
            | Self::Order(OrderError::Repository(_)) => "Internal server error".to_string(),
            Self::Identity(_) | Self::ImageHost(_) => "External service error".to_string(),
            Self::Order(OrderError::Unauthenticated) => "User not authenticated".to_string(),
            Self::Order(OrderError::MissingAddress) => "Please select an address".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Catalog(_)
                | Self::Internal(_)
                | Self::Identity(_)
                | Self::ImageHost(_)
                | Self::Order(OrderError::Repository(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({
            "success": false,
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("test".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::BadRequest("test".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_error_status_mapping() {
        assert_eq!(
            AppError::Order(OrderError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Order(OrderError::MissingAddress).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Order(OrderError::InvalidInput("cart is empty".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Order(OrderError::Repository(RepositoryError::NotFound)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_item_is_bad_request() {
        let err = AppError::Cart(CartError::InvalidItem("missing product id".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.message(), "Internal server error");
    }
}
