use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::handlers::extract::ValidatedJson;
use crate::handlers::{ErrorResponse, error_response, internal_error};
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::services::auth_service::{AuthError, AuthService};

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::InvalidCredentials => error_response(
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Invalid email or password",
            ),
            AuthError::InvalidToken => error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid authentication token",
            ),
            AuthError::TokenExpired => error_response(
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Authentication token has expired",
            ),
            AuthError::DatabaseError(ref msg) => internal_error(msg),
        }
    }
}

/// Handler for user login
///
/// Authenticates a user and returns a JWT token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials or malformed body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, Response> {
    let email = request.email.clone();
    match auth_service.login(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::warn!(%email, "rejected login attempt");
            }
            Err(e.into_response())
        }
    }
}
