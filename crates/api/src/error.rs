//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Saga execution error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Order-level refusals answer 400 with the saga's reason; infrastructure
/// failures stay 500 and never leak wire details beyond the reason text.
fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::InvalidRequest(_)
        | SagaError::ProductNotFound(_)
        | SagaError::InsufficientStock(_)
        | SagaError::InsufficientBalance
        | SagaError::StockReductionFailed
        | SagaError::OrderNotPlaceable(_)
        | SagaError::OrderNotCancellable(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SagaError::WalletService(_)
        | SagaError::UserService(_)
        | SagaError::Entity(_)
        | SagaError::PhaseTimeout { .. } => {
            tracing::error!(error = %err, "saga infrastructure error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
