use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use triagedesk::bootstrap::{self, Settings};
use triagedesk::config::Config;
use triagedesk::infrastructure::http::build_router;
use triagedesk::infrastructure::observability;
use triagedesk::infrastructure::persistence::Database;
use triagedesk::infrastructure::runtime::TokioTaskSpawner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    let _observability = observability::init(&config)?;
    tracing::info!("Configuration loaded");

    // Initialize database connection
    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    let spawner = TokioTaskSpawner::new();
    let adapters = bootstrap::production_adapters(&db, &config, Arc::new(spawner.clone()))?;
    let state = bootstrap::build_app_state(adapters, Settings::from_config(&config)?);

    let hub = state.hub.clone();
    let sweeper = hub.start_sweeper();

    let app = build_router(state);

    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.shutdown().await;
    if let Err(e) = sweeper.await {
        tracing::error!("Session sweeper task failed: {}", e);
    }

    let unfinished = spawner.drain(Duration::from_secs(10)).await;
    if unfinished > 0 {
        tracing::warn!("Exiting with {} background tasks still running", unfinished);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
