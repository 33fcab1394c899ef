/// Catabasis: project variables and schemaless databases for static sites
///
/// Owners manage projects through an authenticated JSON API; static sites read
/// the published data through secret-keyed, read-only endpoints.

// Core configuration and setup
pub mod config;

// Shared HTTP error type
pub mod error;

// Owners, projects, catalog database and access log
pub mod project;

// Variables and schemaless databases owned by projects
pub mod content;

// Public data access: credential validation, readers, access logging
pub mod access;

// Build hook integration for static-site hosts
pub mod deploy;

// HTTP API layer - public read endpoints and management endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use api::AppState;
pub use config::Config;
pub use error::ApiError;
pub use project::{DatabaseManager, Project};
pub use server::{build_router, create_app, start_server};
