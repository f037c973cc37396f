use axum::Json;
use serde_json::{Value, json};

/// Route guide served at `/`
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "name": "finance_tracker",
        "routes": {
            "POST /api/auth/login": "Exchange email and password for a bearer token",
            "/api/expenses": "Expenses, filtered to the caller unless admin",
            "/api/categories": "Shared categories, writable by admins",
            "/api/users": "User administration, admin only",
            "GET /api/docs/openapi.json": "OpenAPI document",
            "GET /health": "Liveness probe"
        }
    }))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
