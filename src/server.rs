/// Server setup and initialization
///
/// Wires together all components: catalog database, storages, readers, build
/// hooks and HTTP routes. Provides the application factory for the Axum app.

use crate::{
    api::{
        cors::cors, create_management_routes, create_public_routes, public::unmatched_public_path, AppState,
    },
    config::Config,
    error::ApiError,
    project::DatabaseManager,
};
use anyhow::Result;
use axum::{
    http::{Method, Uri},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes and middleware
///
/// Opens the catalog database, builds the shared state and mounts the routes.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("🏗️ Initializing catalog database");
    let database = DatabaseManager::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open catalog database: {}", e))?;

    tracing::info!("⚙️ Initializing application state");
    let state = AppState::new(&database, &config.build_hooks)?;

    let app = build_router(state);
    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Mount public and management routes on a prepared state
///
/// The CORS layer is applied last so it also covers the fallback; preflight
/// requests to any path are answered there.
pub fn build_router(state: AppState) -> Router {
    tracing::info!("📡 Creating HTTP router with all endpoints");
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Public read API for static sites
        .merge(create_public_routes())
        // Owner-authenticated management API
        .merge(create_management_routes(state.clone()))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Catabasis server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

/// Fallback: incomplete public read paths get their 400/405, anything else 404
async fn not_found(method: Method, uri: Uri) -> ApiError {
    unmatched_public_path(&method, uri.path()).unwrap_or_else(|| ApiError::not_found("Not found"))
}
