use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::handlers::extract::{ResourceId, ValidatedJson};
use crate::handlers::{ErrorResponse, error_response, internal_error};
use crate::models::auth::RequestIdentity;
use crate::models::user::{
    CreateUserRequest, DeletedUser, ReplaceUserRequest, User, UserChanges,
};
use crate::services::user_service::{UserError, UserService};

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match self {
            UserError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "not_found", "User not found")
            }
            UserError::DuplicateEmail => error_response(
                StatusCode::CONFLICT,
                "duplicate_email",
                "Email already exists",
            ),
            UserError::Forbidden => {
                error_response(StatusCode::FORBIDDEN, "forbidden", "Admin role required")
            }
            UserError::CannotDeleteSelf => error_response(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Administrators cannot delete their own account",
            ),
            UserError::NothingToUpdate => error_response(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "At least one field must be provided",
            ),
            UserError::DatabaseError(ref msg) => internal_error(msg),
        }
    }
}

/// List every user
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users ordered by id", body = Vec<User>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(caller): Extension<RequestIdentity>,
) -> Result<Json<Vec<User>>, Response> {
    match user_service.list_users(&caller).await {
        Ok(users) => Ok(Json(users)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
) -> Result<Json<User>, Response> {
    match user_service.get_user(&caller, id).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

/// Create a user account with a hashed password
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(caller): Extension<RequestIdentity>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), Response> {
    match user_service.create_user(&caller, request).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

/// Replace a user's name, email and role. The password changes only when supplied.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = ReplaceUserRequest,
    responses(
        (status = 200, description = "User replaced", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn replace_user_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<ReplaceUserRequest>,
) -> Result<Json<User>, Response> {
    match user_service.replace_user(&caller, id, request).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UserChanges,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error or empty update", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
    ValidatedJson(changes): ValidatedJson<UserChanges>,
) -> Result<Json<User>, Response> {
    match user_service.update_user(&caller, id, changes).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

/// Delete a user and every expense they own
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User and owned expenses deleted", body = DeletedUser),
        (status = 403, description = "Admin role required or self-delete", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
) -> Result<Json<DeletedUser>, Response> {
    match user_service.delete_user(&caller, id).await {
        Ok(deleted) => Ok(Json(deleted)),
        Err(e) => Err(e.into_response()),
    }
}
