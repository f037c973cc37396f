use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::handlers::error_response;
use crate::models::auth::RequestIdentity;
use crate::services::access_policy;

/// Route gate that lets only admins through. Must run after `auth_middleware`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, Response> {
    let Some(identity) = request.extensions().get::<RequestIdentity>() else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "missing_token",
            "Missing authorization token",
        ));
    };

    if access_policy::require_admin(identity).is_err() {
        tracing::warn!(
            user_id = identity.user_id,
            path = %request.uri().path(),
            "non-admin request to admin-only route"
        );
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            "Admin role required",
        ));
    }

    Ok(next.run(request).await)
}
