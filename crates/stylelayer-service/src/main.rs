//! StyleLayer Service - HTTP API for sessions, credits and generations
//!
//! This is the main entry point for the stylelayer service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stylelayer_service::{create_router, AppState, ServiceConfig};
use stylelayer_store::SqliteStore;

/// How often expired sessions are purged.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stylelayer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting StyleLayer Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_url = %config.database_url,
        google_configured = %config.google_client_id.is_some(),
        vision_configured = %config.vision_api_url.is_some(),
        paypal_configured = %config.paypal_client_id.is_some(),
        "Service configuration loaded"
    );

    // Open the SQLite store and apply the schema
    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);

    // Periodic session housekeeping
    let purge_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = purge_store.purge_expired_sessions().await {
                tracing::error!(error = %e, "Session purge failed");
            }
        }
    });

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
