/// Public read-only API for static sites
///
/// GET endpoints authenticated by the site UUID in the path and the
/// `X-API-Secret` header. Per request: identifiers, then secret, then
/// credential validation and the read, then a detached access-log write.

use crate::{
    access::readers::{DatabaseById, DatabaseByName, VariableValue},
    api::{
        response::{method_not_allowed, ApiResponse},
        AppState,
    },
    error::ApiError,
    project::types::{AccessLogEntry, ProjectCredentials},
};
use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::{HeaderMap, Method},
    routing::get,
    Router,
};
use std::collections::{BTreeMap, HashMap};

const SECRET_HEADER: &str = "x-api-secret";

/// Create public read routes
///
/// Non-GET verbs get a JSON 405; OPTIONS never reaches these handlers.
pub fn create_public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{site_uuid}/variables",
            get(get_all_variables).fallback(method_not_allowed),
        )
        .route(
            "/projects/{site_uuid}/variables/{key}",
            get(get_variable).fallback(method_not_allowed),
        )
        .route(
            "/projects/{site_uuid}/databases/{name}",
            get(get_database_by_name).fallback(method_not_allowed),
        )
        .route(
            "/projects/{site_uuid}/databases/id/{database_id}",
            get(get_database_by_id).fallback(method_not_allowed),
        )
        // Query-string endpoints kept for sites built against the function URLs
        .route(
            "/.netlify/functions/get-variable",
            get(function_get_variable).fallback(method_not_allowed),
        )
        .route(
            "/.netlify/functions/get-database",
            get(function_get_database).fallback(method_not_allowed),
        )
}

/// GET /projects/{site_uuid}/variables/{key}
async fn get_variable(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<ApiResponse<VariableValue>, ApiError> {
    let (site_uuid, key) = path
        .ok()
        .and_then(|Path((site_uuid, key))| Some((required(&site_uuid)?, required(&key)?)))
        .ok_or_else(|| ApiError::bad_request("Site UUID and variable key required"))?;

    read_variable(&state, &headers, &site_uuid, &key).await
}

/// GET /projects/{site_uuid}/variables
async fn get_all_variables(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse<BTreeMap<String, String>>, ApiError> {
    let site_uuid = path
        .ok()
        .and_then(|Path(site_uuid)| required(&site_uuid))
        .ok_or_else(|| ApiError::bad_request("Site UUID required"))?;
    let api_secret = api_secret(&headers)?;

    let resolved = state.variable_reader.get_all_variables(&site_uuid, &api_secret).await?;
    tracing::debug!("📤 Served {} variables for site {}", resolved.data.len(), site_uuid);

    log_access(&state, &resolved.project, format!("/projects/{}/variables", site_uuid), &headers);
    Ok(ApiResponse::ok(resolved.data))
}

/// GET /projects/{site_uuid}/databases/{name}
async fn get_database_by_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<ApiResponse<DatabaseByName>, ApiError> {
    let (site_uuid, name) = path
        .ok()
        .and_then(|Path((site_uuid, name))| Some((required(&site_uuid)?, required(&name)?)))
        .ok_or_else(|| ApiError::bad_request("Site UUID and database name required"))?;

    read_database_by_name(&state, &headers, &site_uuid, &name).await
}

/// GET /projects/{site_uuid}/databases/id/{database_id}
async fn get_database_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<ApiResponse<DatabaseById>, ApiError> {
    let (site_uuid, database_id) = path
        .ok()
        .and_then(|Path((site_uuid, id))| Some((required(&site_uuid)?, required(&id)?)))
        .ok_or_else(|| ApiError::bad_request("Site UUID and database ID required"))?;
    let api_secret = api_secret(&headers)?;

    let resolved = state
        .database_reader
        .get_database_data(&site_uuid, &api_secret, &database_id)
        .await?;

    log_access(
        &state,
        &resolved.project,
        format!("/projects/{}/databases/id/{}", site_uuid, database_id),
        &headers,
    );
    Ok(ApiResponse::ok(resolved.data))
}

/// GET /.netlify/functions/get-variable?siteUuid=...&key=...
async fn function_get_variable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<VariableValue>, ApiError> {
    let site_uuid = params.get("siteUuid").and_then(|v| required(v));
    let key = params.get("key").and_then(|v| required(v));
    let (site_uuid, key) = site_uuid
        .zip(key)
        .ok_or_else(|| ApiError::bad_request("Site UUID and variable key required"))?;

    read_variable(&state, &headers, &site_uuid, &key).await
}

/// GET /.netlify/functions/get-database?siteUuid=...&name=...
async fn function_get_database(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<DatabaseByName>, ApiError> {
    let site_uuid = params.get("siteUuid").and_then(|v| required(v));
    let name = params.get("name").and_then(|v| required(v));
    let (site_uuid, name) = site_uuid
        .zip(name)
        .ok_or_else(|| ApiError::bad_request("Site UUID and database name required"))?;

    read_database_by_name(&state, &headers, &site_uuid, &name).await
}

async fn read_variable(
    state: &AppState,
    headers: &HeaderMap,
    site_uuid: &str,
    key: &str,
) -> Result<ApiResponse<VariableValue>, ApiError> {
    let api_secret = api_secret(headers)?;

    let resolved = state.variable_reader.get_variable(site_uuid, &api_secret, key).await?;

    log_access(state, &resolved.project, format!("/projects/{}/variables/{}", site_uuid, key), headers);
    Ok(ApiResponse::ok(resolved.data))
}

async fn read_database_by_name(
    state: &AppState,
    headers: &HeaderMap,
    site_uuid: &str,
    name: &str,
) -> Result<ApiResponse<DatabaseByName>, ApiError> {
    let api_secret = api_secret(headers)?;

    let resolved = state
        .database_reader
        .get_database_data_by_name(site_uuid, &api_secret, name)
        .await?;
    tracing::debug!("📤 Served {} rows of '{}' for site {}", resolved.data.rows.len(), name, site_uuid);

    log_access(state, &resolved.project, format!("/projects/{}/databases/{}", site_uuid, name), headers);
    Ok(ApiResponse::ok(resolved.data))
}

/// Error for a public read path that missed its route because a segment is empty
///
/// `/projects/abc/variables/` or `/projects//variables` never match the routes
/// above; they are still public reads and answer 405 or 400, not 404.
pub fn unmatched_public_path(method: &Method, path: &str) -> Option<ApiError> {
    let segments: Vec<&str> = path.strip_prefix("/projects/")?.split('/').collect();
    let message = match segments.as_slice() {
        [_, "variables"] => "Site UUID required",
        [_, "variables", _] => "Site UUID and variable key required",
        [_, "databases", "id", _] => "Site UUID and database ID required",
        [_, "databases", _] => "Site UUID and database name required",
        _ => return None,
    };

    if *method != Method::GET {
        return Some(ApiError::MethodNotAllowed);
    }
    Some(ApiError::bad_request(message))
}

/// Dispatch the access log write without waiting for it
fn log_access(state: &AppState, project: &ProjectCredentials, endpoint: String, headers: &HeaderMap) {
    let entry = AccessLogEntry::from_headers(project.project_id.clone(), endpoint, headers);
    drop(state.access_logger.record(entry));
}

/// Secret from `X-API-Secret`; HeaderMap lookups are case-insensitive
fn api_secret(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(required)
        .ok_or_else(|| ApiError::unauthorized("API secret required"))
}

fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
