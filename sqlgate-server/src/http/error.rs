//! API error types with IntoResponse.
//!
//! Core errors are rendered as JSON bodies with per-kind status codes; the
//! core itself knows nothing about transport status.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use sqlgate_core::GatewayError;

/// API error type with automatic HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request payload (400), surfaced verbatim
    Validation { message: String },

    /// Handle not present in a registry (404)
    NotFound,

    /// Failed to establish a connection (502)
    Connection { message: String },

    /// Driver-level failure while running a query (422)
    Execution { message: String },

    /// Internal failure, e.g. handle generation (500, logged)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": message
                }),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": "key does not exist"
                }),
            ),
            Self::Connection { message } => {
                tracing::warn!("connection failure: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "connection_error",
                        "message": message
                    }),
                )
            }
            Self::Execution { message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "execution_error",
                    "message": message
                }),
            ),
            Self::Internal { message } => {
                // Log the actual error, return a generic message
                tracing::error!("internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound => Self::NotFound,
            GatewayError::Connection(message) => Self::Connection { message },
            GatewayError::Execution(message) => Self::Execution { message },
            GatewayError::Generation(message) => Self::Internal { message },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Validation {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation {
            message: "expected value at line 1".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = ApiError::from(GatewayError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn connection_error_is_502() {
        let err = ApiError::from(GatewayError::connection("no route to host"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn execution_error_is_422() {
        let err = ApiError::from(GatewayError::execution("syntax error at or near"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn generation_error_is_500_and_opaque() {
        let err = ApiError::from(GatewayError::Generation("entropy exhausted".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "an internal error occurred");
    }
}
