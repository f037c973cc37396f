//! Request extractors that reject bad input with the standard error body.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::Response,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::handlers::{describe_validation_errors, error_response};

/// JSON body that has been deserialized and passed its `validator` rules
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    &rejection.body_text(),
                )
            })?;

        value.validate().map_err(|errors| {
            error_response(
                StatusCode::BAD_REQUEST,
                "validation_error",
                &describe_validation_errors(&errors),
            )
        })?;

        Ok(Self(value))
    }
}

/// Positive integer `{id}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub i32);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let invalid = || {
            error_response(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Identifiers must be positive integers",
            )
        };

        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid())?;

        if id <= 0 {
            return Err(invalid());
        }
        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::{get, post}};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
    }

    async fn echo(ValidatedJson(payload): ValidatedJson<Payload>) -> String {
        payload.title
    }

    async fn show_id(ResourceId(id): ResourceId) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/items/{id}", get(show_id))
    }

    async fn send(request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post_json(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/echo")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let (status, _) = send(post_json(r#"{"title":"Lunch"}"#)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rule_violation_is_validation_error() {
        let (status, body) = send(post_json(r#"{"title":""}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "title: Title is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let (status, body) = send(post_json(r#"{"title":"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_non_positive_and_non_numeric_ids_are_rejected() {
        for uri in ["/items/0", "/items/-3", "/items/abc"] {
            let request = axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "validation_error");
        }
    }

    #[tokio::test]
    async fn test_positive_id_is_accepted() {
        let request = axum::http::Request::builder()
            .uri("/items/12")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
