/// Catabasis server entry point
///
/// Loads configuration from the environment (and `.env` when present) and
/// starts the HTTP server with:
/// - Public read API at /projects/{site_uuid}/*
/// - Management API at /api/*
/// - Health check at /healthz

use catabasis::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick up CATABASIS_* variables from a local .env during development
    let _ = dotenvy::dotenv();

    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
