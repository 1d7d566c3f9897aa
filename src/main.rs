use anyhow::{Context, Result};

use portal_compras::services::RedisCache;
use portal_compras::{app, config, db, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting procurement portal backend"
    );

    // Create database pool (runs migrations)
    let pool = db::create_pool(&settings).await?;

    // Create Redis cache
    let cache = RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await?;
    tracing::info!("Redis cache initialized");

    // Uploaded documents live under this directory
    tokio::fs::create_dir_all(&settings.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", settings.upload_dir))?;

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), cache);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
