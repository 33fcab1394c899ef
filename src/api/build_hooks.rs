/// Build hook settings, manual triggers and deployment history

use crate::{
    api::{
        extract::{ApiPath, ApiQuery},
        projects::owned_project,
        response::{json_body, ApiResponse},
        AppState,
    },
    deploy::{hook::validate_hook_url, types::HookTestResult, BuildDeployment, TriggerReason},
    error::ApiError,
    project::{types::BuildHookSettings, Owner},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_HISTORY_LIMIT: u32 = 10;
const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct BuildHookSettingsRequest {
    #[serde(default)]
    pub build_hook_url: Option<String>,
    #[serde(default)]
    pub auto_deploy: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TestHookRequest {
    pub url: String,
}

/// GET /api/projects/{id}/build-hook
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
) -> Result<ApiResponse<BuildHookSettings>, ApiError> {
    let project = owned_project(&state, &owner, &project_id).await?;
    Ok(ApiResponse::ok(BuildHookSettings {
        build_hook_url: project.build_hook_url,
        auto_deploy: project.auto_deploy,
        last_deploy_triggered: project.last_deploy_triggered,
    }))
}

/// PUT /api/projects/{id}/build-hook
/// Body: { "build_hook_url": "https://...", "auto_deploy": true }
/// A null or blank URL clears the hook.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
    body: Result<Json<BuildHookSettingsRequest>, JsonRejection>,
) -> Result<ApiResponse<BuildHookSettings>, ApiError> {
    let request = json_body(body)?;
    owned_project(&state, &owner, &project_id).await?;

    let hook_url = match request.build_hook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(validate_hook_url(url)?),
        _ => None,
    };

    let settings = state
        .projects
        .update_build_hook_settings(&project_id, hook_url.as_deref(), request.auto_deploy)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    tracing::info!(
        "🔧 Build hook settings updated for project {} (auto_deploy: {})",
        project_id,
        settings.auto_deploy
    );
    Ok(ApiResponse::ok(settings))
}

/// POST /api/projects/{id}/build-hook/trigger
pub async fn trigger(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;

    let dispatch = state
        .build_hooks
        .trigger(&project_id, TriggerReason::Manual, json!({ "source": "manual" }))
        .await?
        .ok_or_else(|| ApiError::bad_request("No build hook configured for this project"))?;

    Ok(ApiResponse::ok(json!({ "deployment_id": dispatch.deployment_id })))
}

/// GET /api/projects/{id}/deployments?limit=10
pub async fn history(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<ApiResponse<Vec<BuildDeployment>>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);

    let deployments = state.build_hooks.deployments().history(&project_id, limit).await?;
    Ok(ApiResponse::ok(deployments))
}

/// GET /api/projects/{id}/deployments/{deployment_id}
pub async fn get_deployment(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, deployment_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<BuildDeployment>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;

    let deployment = state
        .build_hooks
        .deployments()
        .get(&deployment_id)
        .await?
        .filter(|deployment| deployment.project_id == project_id)
        .ok_or_else(|| ApiError::not_found("Deployment not found"))?;

    Ok(ApiResponse::ok(deployment))
}

/// POST /api/build-hooks/test
/// Body: { "url": "https://..." }
pub async fn test_hook(
    State(state): State<AppState>,
    body: Result<Json<TestHookRequest>, JsonRejection>,
) -> Result<ApiResponse<HookTestResult>, ApiError> {
    let request = json_body(body)?;
    let url = validate_hook_url(&request.url)?;

    let result = state.build_hooks.test(&url).await;
    tracing::info!("🧪 Build hook test against {}: {}", url, result.message);

    Ok(ApiResponse::ok(result))
}
