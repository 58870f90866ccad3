use finance_backend::api::{create_router, AppState};
use finance_backend::config::Settings;
use finance_backend::observability::{init_logging, init_metrics};
use finance_backend::services::TokenIssuer;
use finance_backend::storage::S3Gateway;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    init_logging(&settings.application.log_config());
    info!("Configuration loaded");

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;

    info!("Database connection established");

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied successfully");

    // Object storage
    if !settings.storage.has_credentials() {
        warn!(endpoint = %settings.storage.endpoint, "object storage credentials are empty");
    }
    let files = Arc::new(S3Gateway::new(&settings.storage));

    let tokens = TokenIssuer::from_settings(&settings.auth)?;
    let metrics = init_metrics()?;

    let state = AppState::new(pool, files, tokens, settings.storage.image_bucket.clone())
        .with_metrics(metrics)
        .with_content_routes(settings.application.content_routes);

    let app = create_router(state);

    let address = settings.application.address();
    let listener = TcpListener::bind(&address).await?;
    info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
