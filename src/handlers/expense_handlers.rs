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
use crate::models::expense::{
    CreateExpenseRequest, Expense, ExpenseChanges, ReplaceExpenseRequest,
};
use crate::services::expense_service::{ExpenseError, ExpenseService};

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        match self {
            ExpenseError::ExpenseNotFound => {
                error_response(StatusCode::NOT_FOUND, "not_found", "Expense not found")
            }
            ExpenseError::Forbidden(message) => {
                error_response(StatusCode::FORBIDDEN, "forbidden", message)
            }
            ExpenseError::NothingToUpdate => error_response(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "At least one field must be provided",
            ),
            ExpenseError::InvalidReference => error_response(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Referenced owner or category does not exist",
            ),
            ExpenseError::DatabaseError(ref msg) => internal_error(msg),
        }
    }
}

/// Handler for listing expenses
///
/// Admins get every expense, other users only their own.
#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "Visible expenses, newest first", body = Vec<Expense>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(caller): Extension<RequestIdentity>,
) -> Result<Json<Vec<Expense>>, Response> {
    match expense_service.list_expenses(&caller).await {
        Ok(expenses) => Ok(Json(expenses)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "The expense", body = Expense),
        (status = 404, description = "Expense not found or owned by someone else", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn get_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
) -> Result<Json<Expense>, Response> {
    match expense_service.get_expense(&caller, id).await {
        Ok(expense) => Ok(Json(expense)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating an expense
///
/// `owner_id` defaults to the caller.
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = Expense),
        (status = 400, description = "Validation error or unknown category", body = ErrorResponse),
        (status = 403, description = "Assigning another owner requires admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn create_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(caller): Extension<RequestIdentity>,
    ValidatedJson(request): ValidatedJson<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), Response> {
    match expense_service.create_expense(&caller, request).await {
        Ok(expense) => Ok((StatusCode::CREATED, Json(expense))),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense ID")),
    request_body = ReplaceExpenseRequest,
    responses(
        (status = 200, description = "Expense replaced", body = Expense),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Assigning another owner requires admin", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn replace_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
    ValidatedJson(request): ValidatedJson<ReplaceExpenseRequest>,
) -> Result<Json<Expense>, Response> {
    match expense_service.replace_expense(&caller, id, request).await {
        Ok(expense) => Ok(Json(expense)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for partially updating an expense
///
/// Only the supplied fields change. Changing the owner requires admin.
#[utoipa::path(
    patch,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense ID")),
    request_body = ExpenseChanges,
    responses(
        (status = 200, description = "Expense updated", body = Expense),
        (status = 400, description = "Validation error or empty update", body = ErrorResponse),
        (status = 403, description = "Changing the owner requires admin", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn update_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
    ValidatedJson(changes): ValidatedJson<ExpenseChanges>,
) -> Result<Json<Expense>, Response> {
    match expense_service.update_expense(&caller, id, changes).await {
        Ok(expense) => Ok(Json(expense)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense ID")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(caller): Extension<RequestIdentity>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, Response> {
    match expense_service.delete_expense(&caller, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
