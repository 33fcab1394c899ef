/// Project management endpoints
///
/// Owner-scoped CRUD over projects, API secret rotation and usage reporting.
/// A project owned by someone else is indistinguishable from a missing one.

use crate::{
    api::{
        extract::{ApiPath, ApiQuery},
        response::{json_body, ApiResponse},
        AppState,
    },
    error::ApiError,
    project::{
        types::{NewProject, ProjectUpdate, UsageEntry},
        Owner, Project,
    },
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_USAGE_DAYS: u32 = 30;
const MAX_USAGE_DAYS: u32 = 3650;

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub days: Option<u32>,
}

/// Load a project the caller owns, or 404
pub async fn owned_project(state: &AppState, owner: &Owner, project_id: &str) -> Result<Project, ApiError> {
    state
        .projects
        .get_owned_project(&owner.id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
) -> Result<ApiResponse<Vec<Project>>, ApiError> {
    let projects = state.projects.list_projects(&owner.id).await?;
    Ok(ApiResponse::ok(projects))
}

/// POST /api/projects
/// Body: { "name": "...", "description": "..." }
pub async fn create_project(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> Result<ApiResponse<Project>, ApiError> {
    let request = json_body(body)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Project name is required"));
    }

    let project = state.projects.create_project(&owner.id, &request).await?;
    tracing::info!("📦 Created project {} ({}) for owner {}", project.id, project.name, owner.id);

    Ok(ApiResponse::created(project))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Project>, ApiError> {
    let project = owned_project(&state, &owner, &id).await?;
    Ok(ApiResponse::ok(project))
}

/// PUT /api/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(id): ApiPath<String>,
    body: Result<Json<ProjectUpdate>, JsonRejection>,
) -> Result<ApiResponse<Project>, ApiError> {
    let update = json_body(body)?;
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::bad_request("Project name cannot be empty"));
    }

    owned_project(&state, &owner, &id).await?;
    let project = state
        .projects
        .update_project(&id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    tracing::info!("✏️ Updated project {}", id);
    Ok(ApiResponse::ok(project))
}

/// DELETE /api/projects/{id}
/// Variables, databases, rows, logs and deployments go with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    owned_project(&state, &owner, &id).await?;

    if !state.projects.delete_project(&id).await? {
        return Err(ApiError::not_found("Project not found"));
    }

    tracing::info!("🗑️ Deleted project {}", id);
    Ok(ApiResponse::ok(json!({ "id": id, "deleted": true })))
}

/// POST /api/projects/{id}/secret
pub async fn regenerate_secret(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Project>, ApiError> {
    owned_project(&state, &owner, &id).await?;
    let project = state
        .projects
        .regenerate_secret(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    tracing::info!("🔑 Regenerated API secret for project {}", id);
    Ok(ApiResponse::ok(project))
}

/// GET /api/projects/{id}/usage?days=30
pub async fn project_usage(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<UsageQuery>,
) -> Result<ApiResponse<Vec<UsageEntry>>, ApiError> {
    owned_project(&state, &owner, &id).await?;
    let days = query.days.unwrap_or(DEFAULT_USAGE_DAYS).clamp(1, MAX_USAGE_DAYS);

    let usage = state.access_logs.usage(&id, days).await?;
    Ok(ApiResponse::ok(usage))
}
