use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::handlers::error_response;
use crate::services::auth_service::{self, AuthService};

/// Auth middleware that validates the bearer token and stores the caller's
/// `RequestIdentity` in the request extensions
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidTokenFormat)?;

    let identity = auth_service
        .validate_token(token)
        .await
        .map_err(|e| match e {
            auth_service::AuthError::TokenExpired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

    tracing::debug!(user_id = identity.user_id, role = ?identity.role, "authenticated request");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Auth middleware errors
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (error, message) = match self {
            AuthError::MissingToken => ("missing_token", "Missing authorization token"),
            AuthError::InvalidTokenFormat => (
                "invalid_token",
                "Invalid authorization header format. Expected: Bearer <token>",
            ),
            AuthError::InvalidToken => ("invalid_token", "Invalid or malformed token"),
            AuthError::TokenExpired => ("token_expired", "Token has expired"),
        };

        error_response(StatusCode::UNAUTHORIZED, error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{LoginRequest, RequestIdentity};
    use crate::models::user::Role;
    use crate::services::auth_service::AuthServiceImpl;
    use crate::test_utils::InMemoryStore;
    use axum::{
        Extension, Json, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use serde_json::json;
    use tower::ServiceExt;

    // Test handler that requires authentication
    async fn protected_handler(Extension(caller): Extension<RequestIdentity>) -> impl IntoResponse {
        Json(json!({
            "user_id": caller.user_id,
            "name": caller.name,
            "message": "Access granted"
        }))
    }

    fn create_test_app(auth_service: Arc<dyn AuthService>) -> Router {
        Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            ))
            .with_state(auth_service)
    }

    fn auth_service_with_user() -> (Arc<dyn AuthService>, i32) {
        let store = Arc::new(InMemoryStore::new());
        let user = store.seed_user("Test User", "test@example.com", "password123", Role::Common);
        let service: Arc<dyn AuthService> =
            Arc::new(AuthServiceImpl::new(store, "test_secret".to_string()));
        (service, user.id)
    }

    async fn login(auth_service: &Arc<dyn AuthService>) -> String {
        let login_request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        auth_service.login(login_request).await.unwrap().token
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_middleware_with_valid_token() {
        let (auth_service, user_id) = auth_service_with_user();
        let token = login(&auth_service).await;
        let app = create_test_app(auth_service);

        let (status, body) = call(app, Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], user_id);
        assert_eq!(body["name"], "Test User");
        assert_eq!(body["message"], "Access granted");
    }

    #[tokio::test]
    async fn test_middleware_without_token() {
        let (auth_service, _) = auth_service_with_user();
        let app = create_test_app(auth_service);

        let (status, body) = call(app, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_token");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("Missing authorization token")
        );
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_token() {
        let (auth_service, _) = auth_service_with_user();
        let app = create_test_app(auth_service);

        let (status, body) = call(app, Some("Bearer invalid_token_here")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_middleware_with_expired_token() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_user("Test User", "test@example.com", "password123", Role::Common);
        let auth_service: Arc<dyn AuthService> = Arc::new(
            AuthServiceImpl::new(store, "test_secret".to_string())
                .with_token_ttl(chrono::Duration::hours(-2)),
        );
        let token = login(&auth_service).await;
        let app = create_test_app(auth_service);

        let (status, body) = call(app, Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "token_expired");
    }

    #[tokio::test]
    async fn test_middleware_with_malformed_header() {
        let (auth_service, _) = auth_service_with_user();
        let app = create_test_app(auth_service);

        // Test without "Bearer " prefix
        let (status, body) = call(app, Some("some_token")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("Invalid authorization header format")
        );
    }
}
