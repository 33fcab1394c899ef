/// Variable, database and row management endpoints
///
/// Every mutation of published content notifies the build hook service;
/// delivery runs detached and never affects the response.

use crate::{
    api::{
        extract::ApiPath,
        projects::owned_project,
        response::{json_body, ApiResponse},
        AppState,
    },
    content::{
        types::{DatabaseUpdate, NewDatabase, NewVariable, RowPayload, VariableUpdate},
        Database, DatabaseRow, Variable,
    },
    deploy::TriggerReason,
    error::ApiError,
    project::Owner,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

/// GET /api/projects/{id}/variables
pub async fn list_variables(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
) -> Result<ApiResponse<Vec<Variable>>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;
    let variables = state.variables.list(&project_id).await?;
    Ok(ApiResponse::ok(variables))
}

/// POST /api/projects/{id}/variables
/// Body: { "name": "...", "value": "..." }
pub async fn create_variable(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
    body: Result<Json<NewVariable>, JsonRejection>,
) -> Result<ApiResponse<Variable>, ApiError> {
    let request = json_body(body)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Variable name is required"));
    }
    owned_project(&state, &owner, &project_id).await?;

    let variable = state
        .variables
        .create(&project_id, &request)
        .await
        .map_err(|e| ApiError::conflict_or_internal(e, format!("Variable '{}' already exists", request.name.trim())))?;

    tracing::info!("➕ Created variable {} in project {}", variable.name, project_id);
    state.build_hooks.notify(
        &project_id,
        TriggerReason::VariableUpdate,
        json!({ "action": "create", "variable": { "name": variable.name, "value": variable.value } }),
    );

    Ok(ApiResponse::created(variable))
}

/// PUT /api/projects/{id}/variables/{variable_id}
pub async fn update_variable(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, variable_id)): ApiPath<(String, String)>,
    body: Result<Json<VariableUpdate>, JsonRejection>,
) -> Result<ApiResponse<Variable>, ApiError> {
    let update = json_body(body)?;
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::bad_request("Variable name cannot be empty"));
    }
    owned_project(&state, &owner, &project_id).await?;

    let variable = state
        .variables
        .update(&project_id, &variable_id, &update)
        .await
        .map_err(|e| ApiError::conflict_or_internal(e, "Variable name already in use"))?
        .ok_or_else(|| ApiError::not_found("Variable not found"))?;

    tracing::info!("✏️ Updated variable {} in project {}", variable.name, project_id);
    state.build_hooks.notify(
        &project_id,
        TriggerReason::VariableUpdate,
        json!({ "action": "update", "variable": { "name": variable.name, "value": variable.value } }),
    );

    Ok(ApiResponse::ok(variable))
}

/// DELETE /api/projects/{id}/variables/{variable_id}
pub async fn delete_variable(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, variable_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<Value>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;

    if !state.variables.delete(&project_id, &variable_id).await? {
        return Err(ApiError::not_found("Variable not found"));
    }

    tracing::info!("🗑️ Deleted variable {} from project {}", variable_id, project_id);
    state.build_hooks.notify(
        &project_id,
        TriggerReason::VariableUpdate,
        json!({ "action": "delete", "variable_id": variable_id }),
    );

    Ok(ApiResponse::ok(json!({ "id": variable_id, "deleted": true })))
}

/// GET /api/projects/{id}/databases
pub async fn list_databases(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
) -> Result<ApiResponse<Vec<Database>>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;
    let databases = state.databases.list(&project_id).await?;
    Ok(ApiResponse::ok(databases))
}

/// POST /api/projects/{id}/databases
/// Body: { "name": "...", "description": "...", "columns": ["..."] }
pub async fn create_database(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath(project_id): ApiPath<String>,
    body: Result<Json<NewDatabase>, JsonRejection>,
) -> Result<ApiResponse<Database>, ApiError> {
    let request = json_body(body)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Database name is required"));
    }
    owned_project(&state, &owner, &project_id).await?;

    let database = state
        .databases
        .create(&project_id, &request)
        .await
        .map_err(|e| ApiError::conflict_or_internal(e, format!("Database '{}' already exists", request.name.trim())))?;

    tracing::info!("🗃️ Created database {} in project {}", database.name, project_id);
    Ok(ApiResponse::created(database))
}

/// GET /api/projects/{id}/databases/{database_id}
pub async fn get_database(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<Database>, ApiError> {
    let database = owned_database(&state, &owner, &project_id, &database_id).await?;
    Ok(ApiResponse::ok(database))
}

/// PUT /api/projects/{id}/databases/{database_id}
pub async fn update_database(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id)): ApiPath<(String, String)>,
    body: Result<Json<DatabaseUpdate>, JsonRejection>,
) -> Result<ApiResponse<Database>, ApiError> {
    let update = json_body(body)?;
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::bad_request("Database name cannot be empty"));
    }
    owned_project(&state, &owner, &project_id).await?;

    let database = state
        .databases
        .update(&project_id, &database_id, &update)
        .await
        .map_err(|e| ApiError::conflict_or_internal(e, "Database name already in use"))?
        .ok_or_else(|| ApiError::not_found("Database not found"))?;

    tracing::info!("✏️ Updated database {} in project {}", database.name, project_id);
    Ok(ApiResponse::ok(database))
}

/// DELETE /api/projects/{id}/databases/{database_id}
pub async fn delete_database(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<Value>, ApiError> {
    owned_project(&state, &owner, &project_id).await?;

    if !state.databases.delete(&project_id, &database_id).await? {
        return Err(ApiError::not_found("Database not found"));
    }

    tracing::info!("🗑️ Deleted database {} from project {}", database_id, project_id);
    Ok(ApiResponse::ok(json!({ "id": database_id, "deleted": true })))
}

/// GET /api/projects/{id}/databases/{database_id}/rows
pub async fn list_rows(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id)): ApiPath<(String, String)>,
) -> Result<ApiResponse<Vec<DatabaseRow>>, ApiError> {
    let database = owned_database(&state, &owner, &project_id, &database_id).await?;
    let rows = state.databases.list_rows(&database.id).await?;
    Ok(ApiResponse::ok(rows))
}

/// POST /api/projects/{id}/databases/{database_id}/rows
/// Body: { "data": { "column": "value", ... } }
pub async fn create_row(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id)): ApiPath<(String, String)>,
    body: Result<Json<RowPayload>, JsonRejection>,
) -> Result<ApiResponse<DatabaseRow>, ApiError> {
    let payload = json_body(body)?;
    let database = owned_database(&state, &owner, &project_id, &database_id).await?;

    let row = state.databases.create_row(&database.id, &payload.data).await?;

    tracing::info!("➕ Added row {} to database {}", row.id, database.name);
    notify_rows_changed(&state, &project_id, &database, "create", &row.id);

    Ok(ApiResponse::created(row))
}

/// PUT /api/projects/{id}/databases/{database_id}/rows/{row_id}
pub async fn update_row(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id, row_id)): ApiPath<(String, String, String)>,
    body: Result<Json<RowPayload>, JsonRejection>,
) -> Result<ApiResponse<DatabaseRow>, ApiError> {
    let payload = json_body(body)?;
    let database = owned_database(&state, &owner, &project_id, &database_id).await?;

    let row = state
        .databases
        .update_row(&database.id, &row_id, &payload.data)
        .await?
        .ok_or_else(|| ApiError::not_found("Row not found"))?;

    notify_rows_changed(&state, &project_id, &database, "update", &row.id);
    Ok(ApiResponse::ok(row))
}

/// DELETE /api/projects/{id}/databases/{database_id}/rows/{row_id}
pub async fn delete_row(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    ApiPath((project_id, database_id, row_id)): ApiPath<(String, String, String)>,
) -> Result<ApiResponse<Value>, ApiError> {
    let database = owned_database(&state, &owner, &project_id, &database_id).await?;

    if !state.databases.delete_row(&database.id, &row_id).await? {
        return Err(ApiError::not_found("Row not found"));
    }

    notify_rows_changed(&state, &project_id, &database, "delete", &row_id);
    Ok(ApiResponse::ok(json!({ "id": row_id, "deleted": true })))
}

async fn owned_database(
    state: &AppState,
    owner: &Owner,
    project_id: &str,
    database_id: &str,
) -> Result<Database, ApiError> {
    owned_project(state, owner, project_id).await?;
    state
        .databases
        .get(project_id, database_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Database not found"))
}

fn notify_rows_changed(state: &AppState, project_id: &str, database: &Database, action: &str, row_id: &str) {
    state.build_hooks.notify(
        project_id,
        TriggerReason::DatabaseUpdate,
        json!({ "action": action, "database": database.name, "row_id": row_id }),
    );
}
