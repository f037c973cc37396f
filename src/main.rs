use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use finance_tracker::app::{AppState, build_router};
use finance_tracker::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finance_tracker=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations completed");

    let app = build_router(AppState::from_pool(pool, &config));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("server running on http://{}", addr);
    tracing::info!("  - health check: http://{}/health", addr);
    tracing::info!("  - login: POST http://{}/api/auth/login", addr);
    tracing::info!("  - API docs: http://{}/api/docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
