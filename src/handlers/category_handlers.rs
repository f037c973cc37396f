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
use crate::models::category::{
    Category, CategoryChanges, CreateCategoryRequest, ReplaceCategoryRequest,
};
use crate::services::category_service::{CategoryError, CategoryService};

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        match self {
            CategoryError::CategoryNotFound => {
                error_response(StatusCode::NOT_FOUND, "not_found", "Category not found")
            }
            CategoryError::CategoryInUse => error_response(
                StatusCode::CONFLICT,
                "category_in_use",
                "Category is still referenced by expenses",
            ),
            CategoryError::Forbidden => error_response(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Only administrators may modify categories",
            ),
            CategoryError::NothingToUpdate => error_response(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "At least one field must be provided",
            ),
            CategoryError::DatabaseError(ref msg) => internal_error(msg),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories, newest first", body = Vec<Category>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
) -> Result<Json<Vec<Category>>, Response> {
    match category_service.get_categories().await {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn get_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    ResourceId(id): ResourceId,
) -> Result<Json<Category>, Response> {
    match category_service.get_category(id).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(caller): Extension<RequestIdentity>,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), Response> {
    match category_service.create_category(&caller, request).await {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = ReplaceCategoryRequest,
    responses(
        (status = 200, description = "Category replaced", body = Category),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn replace_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<ReplaceCategoryRequest>,
) -> Result<Json<Category>, Response> {
    match category_service.replace_category(&caller, id, request).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryChanges,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Validation error or empty update", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
    ValidatedJson(changes): ValidatedJson<CategoryChanges>,
) -> Result<Json<Category>, Response> {
    match category_service.update_category(&caller, id, changes).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still referenced by expenses", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, Response> {
    match category_service.delete_category(&caller, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
