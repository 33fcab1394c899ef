/// HTTP API Layer
///
/// This module provides the REST endpoints of the service. It handles:
/// - Public read-only access for static sites (site UUID + API secret)
/// - Owner-authenticated management of projects and their content
/// - Build hook settings, triggers and history

// CORS middleware for browser consumers
pub mod cors;

// Success envelope and body helpers
pub mod response;

// Extractors that reject with the error envelope
pub mod extract;

// Public read endpoints
pub mod public;

// Owner registration and bearer-token middleware
pub mod auth;

// Management endpoints
pub mod build_hooks;
pub mod content;
pub mod projects;

use crate::{
    access::{AccessLogger, CredentialValidator, DatabaseReader, VariableReader},
    config::BuildHookConfig,
    content::{DatabaseStorage, VariableStorage},
    deploy::{BuildHookService, DeploymentStorage},
    project::{AccessLogStorage, DatabaseManager, ProjectStorage},
};
use anyhow::Result;
use response::method_not_allowed;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

pub use public::create_public_routes;

/// Application state containing shared resources
#[derive(Debug, Clone)]
pub struct AppState {
    pub projects: ProjectStorage,
    pub variables: VariableStorage,
    pub databases: DatabaseStorage,
    pub access_logs: AccessLogStorage,
    pub variable_reader: VariableReader,
    pub database_reader: DatabaseReader,
    pub access_logger: AccessLogger,
    pub build_hooks: BuildHookService,
}

impl AppState {
    /// Wire storages, readers and services around one catalog pool
    pub fn new(database: &DatabaseManager, build_hooks: &BuildHookConfig) -> Result<Self> {
        let pool = database.pool();
        let projects = ProjectStorage::new(pool.clone());
        let variables = VariableStorage::new(pool.clone());
        let databases = DatabaseStorage::new(pool.clone());
        let access_logs = AccessLogStorage::new(pool.clone());

        let validator = CredentialValidator::new(projects.clone());
        let build_hooks = BuildHookService::new(projects.clone(), DeploymentStorage::new(pool), build_hooks)?;

        Ok(Self {
            variable_reader: VariableReader::new(validator.clone(), variables.clone()),
            database_reader: DatabaseReader::new(validator, databases.clone()),
            access_logger: AccessLogger::new(access_logs.clone()),
            projects,
            variables,
            databases,
            access_logs,
            build_hooks,
        })
    }
}

/// Create owner-authenticated management routes
///
/// Registration is the only unauthenticated route; everything else resolves
/// the bearer token first. Unsupported verbs get a JSON 405.
pub fn create_management_routes(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route(
            "/api/projects",
            get(projects::list_projects)
                .post(projects::create_project)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/secret",
            post(projects::regenerate_secret).fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/usage",
            get(projects::project_usage).fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/variables",
            get(content::list_variables)
                .post(content::create_variable)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/variables/{variable_id}",
            put(content::update_variable)
                .delete(content::delete_variable)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/databases",
            get(content::list_databases)
                .post(content::create_database)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/databases/{database_id}",
            get(content::get_database)
                .put(content::update_database)
                .delete(content::delete_database)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/databases/{database_id}/rows",
            get(content::list_rows)
                .post(content::create_row)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/databases/{database_id}/rows/{row_id}",
            put(content::update_row)
                .delete(content::delete_row)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/build-hook",
            get(build_hooks::get_settings)
                .put(build_hooks::update_settings)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/build-hook/trigger",
            post(build_hooks::trigger).fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/deployments",
            get(build_hooks::history).fallback(method_not_allowed),
        )
        .route(
            "/api/projects/{id}/deployments/{deployment_id}",
            get(build_hooks::get_deployment).fallback(method_not_allowed),
        )
        .route(
            "/api/build-hooks/test",
            post(build_hooks::test_hook).fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_owner));

    Router::new()
        .route(
            "/api/owners",
            post(auth::register_owner).fallback(method_not_allowed),
        )
        .merge(authenticated)
}
