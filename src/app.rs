//! Router assembly and the shared application state.

use axum::{
    Json, Router,
    extract::{FromRef, MatchedPath, Request},
    middleware,
    routing::{get, post},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::config::AppConfig;
use crate::handlers::ErrorResponse;
use crate::handlers::auth_handlers::login_handler;
use crate::handlers::category_handlers::{
    create_category_handler, delete_category_handler, get_category_handler,
    list_categories_handler, replace_category_handler, update_category_handler,
};
use crate::handlers::expense_handlers::{
    create_expense_handler, delete_expense_handler, get_expense_handler, list_expenses_handler,
    replace_expense_handler, update_expense_handler,
};
use crate::handlers::index_handlers::{health_check, index_handler};
use crate::handlers::user_handlers::{
    create_user_handler, delete_user_handler, get_user_handler, list_users_handler,
    replace_user_handler, update_user_handler,
};
use crate::middleware::{auth_middleware::auth_middleware, role_middleware};
use crate::models::{
    Category, CategoryChanges, CreateCategoryRequest, CreateExpenseRequest, CreateUserRequest,
    DeletedUser, Expense, ExpenseChanges, LoginRequest, LoginResponse, ReplaceExpenseRequest,
    ReplaceUserRequest, Role, User, UserChanges,
};
use crate::repositories::category_repository::{CategoryRepository, PostgresCategoryRepository};
use crate::repositories::expense_repository::{ExpenseRepository, PostgresExpenseRepository};
use crate::repositories::user_repository::{PostgresUserRepository, UserRepository};
use crate::services::auth_service::{AuthService, AuthServiceImpl};
use crate::services::category_service::{CategoryService, CategoryServiceImpl};
use crate::services::expense_service::{ExpenseService, ExpenseServiceImpl};
use crate::services::user_service::{UserService, UserServiceImpl};

/// Services shared by every handler. Handlers extract the one they need
/// through `State<Arc<dyn ...>>`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub category_service: Arc<dyn CategoryService>,
    pub expense_service: Arc<dyn ExpenseService>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        expenses: Arc<dyn ExpenseRepository>,
        jwt_secret: String,
        token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            auth_service: Arc::new(
                AuthServiceImpl::new(users.clone(), jwt_secret).with_token_ttl(token_ttl),
            ),
            user_service: Arc::new(UserServiceImpl::new(users)),
            category_service: Arc::new(CategoryServiceImpl::new(categories)),
            expense_service: Arc::new(ExpenseServiceImpl::new(expenses)),
        }
    }

    /// State backed by PostgreSQL repositories sharing one pool
    pub fn from_pool(pool: PgPool, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresCategoryRepository::new(pool.clone())),
            Arc::new(PostgresExpenseRepository::new(pool)),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.jwt_expiry_hours),
        )
    }
}

/// Adds the bearer token scheme referenced by the protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        crate::handlers::auth_handlers::login_handler,
        crate::handlers::expense_handlers::list_expenses_handler,
        crate::handlers::expense_handlers::get_expense_handler,
        crate::handlers::expense_handlers::create_expense_handler,
        crate::handlers::expense_handlers::replace_expense_handler,
        crate::handlers::expense_handlers::update_expense_handler,
        crate::handlers::expense_handlers::delete_expense_handler,
        crate::handlers::category_handlers::list_categories_handler,
        crate::handlers::category_handlers::get_category_handler,
        crate::handlers::category_handlers::create_category_handler,
        crate::handlers::category_handlers::replace_category_handler,
        crate::handlers::category_handlers::update_category_handler,
        crate::handlers::category_handlers::delete_category_handler,
        crate::handlers::user_handlers::list_users_handler,
        crate::handlers::user_handlers::get_user_handler,
        crate::handlers::user_handlers::create_user_handler,
        crate::handlers::user_handlers::replace_user_handler,
        crate::handlers::user_handlers::update_user_handler,
        crate::handlers::user_handlers::delete_user_handler,
    ),
    components(
        schemas(
            User, Role, CreateUserRequest, ReplaceUserRequest, UserChanges, DeletedUser,
            Category, CreateCategoryRequest, CategoryChanges,
            Expense, CreateExpenseRequest, ReplaceExpenseRequest, ExpenseChanges,
            LoginRequest, LoginResponse, ErrorResponse
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "expenses", description = "Expenses, scoped to the caller unless admin"),
        (name = "categories", description = "Shared expense categories"),
        (name = "users", description = "User administration (admin only)")
    ),
    info(
        title = "Finance Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal expenses",
    )
)]
pub struct ApiDoc;

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full router: public routes, bearer-protected resources and the
/// admin-only user routes
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route(
            "/api/users",
            get(list_users_handler).post(create_user_handler),
        )
        .route(
            "/api/users/{id}",
            get(get_user_handler)
                .put(replace_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route_layer(middleware::from_fn(role_middleware::require_admin));

    let protected_routes = Router::new()
        .route(
            "/api/expenses",
            get(list_expenses_handler).post(create_expense_handler),
        )
        .route(
            "/api/expenses/{id}",
            get(get_expense_handler)
                .put(replace_expense_handler)
                .patch(update_expense_handler)
                .delete(delete_expense_handler),
        )
        .route(
            "/api/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/api/categories/{id}",
            get(get_category_handler)
                .put(replace_category_handler)
                .patch(update_category_handler)
                .delete(delete_category_handler),
        )
        .merge(user_routes)
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|matched_path| matched_path.as_str());

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            matched_path
        )
    });

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_check))
        .route("/api/docs/openapi.json", get(openapi_handler))
        .route("/api/auth/login", post(login_handler))
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
