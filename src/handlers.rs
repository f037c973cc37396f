use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

pub mod auth_handlers;
pub mod category_handlers;
pub mod expense_handlers;
pub mod extract;
pub mod index_handlers;
pub mod user_handlers;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub(crate) fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    (status, Json(ErrorResponse::new(error, message))).into_response()
}

/// 500 with a fixed body. The detail only goes to the log.
pub(crate) fn internal_error(detail: &str) -> Response {
    tracing::error!(detail, "request failed with a storage error");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An unexpected error occurred",
    )
}

/// Flatten validator output into `field: message; field: message`
pub(crate) fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut described = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<_>>();
    described.sort();
    described.join("; ")
}
