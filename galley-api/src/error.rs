use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use galley_order::{CompositionError, FulfillmentError, OrderError};
use galley_shared::WorkItemIdError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CompositionError> for AppError {
    fn from(err: CompositionError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<WorkItemIdError> for AppError {
    fn from(err: WorkItemIdError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::OrderNotFound(_)
            | FulfillmentError::WorkItemNotFound(_)
            | FulfillmentError::NotRoutedHere { .. } => AppError::NotFoundError(err.to_string()),
            FulfillmentError::InvalidTransition { .. }
            | FulfillmentError::DuplicateOrder(_)
            | FulfillmentError::DuplicateLine(_) => AppError::ConflictError(err.to_string()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder | OrderError::PriceMismatch(_) => AppError::ValidationError(err.to_string()),
            OrderError::Fulfillment(e) => e.into(),
        }
    }
}

impl From<prometheus::Error> for AppError {
    fn from(err: prometheus::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}
