/// SQLite persistence for project variables

use crate::content::types::{NewVariable, Variable, VariableUpdate};
use crate::project::database::timestamp_now;
use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

const VARIABLE_COLUMNS: &str = "id, project_id, name, value, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct VariableStorage {
    pool: SqlitePool,
}

impl VariableStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List a project's variables, newest first
    pub async fn list(&self, project_id: &str) -> Result<Vec<Variable>> {
        let variables = sqlx::query_as::<_, Variable>(&format!(
            "SELECT {} FROM variables WHERE project_id = ? ORDER BY created_at DESC, rowid DESC",
            VARIABLE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variables)
    }

    /// Insert a variable; a duplicate name surfaces as a unique violation
    pub async fn create(&self, project_id: &str, request: &NewVariable) -> Result<Variable> {
        let now = timestamp_now();
        let variable = Variable {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: request.name.trim().to_string(),
            value: request.value.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO variables (id, project_id, name, value, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&variable.id)
        .bind(&variable.project_id)
        .bind(&variable.name)
        .bind(&variable.value)
        .bind(&variable.created_at)
        .bind(&variable.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(variable)
    }

    pub async fn get(&self, project_id: &str, id: &str) -> Result<Option<Variable>> {
        let variable = sqlx::query_as::<_, Variable>(&format!(
            "SELECT {} FROM variables WHERE id = ? AND project_id = ?",
            VARIABLE_COLUMNS
        ))
        .bind(id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variable)
    }

    /// Exact name lookup scoped to one project
    pub async fn find_by_name(&self, project_id: &str, name: &str) -> Result<Option<Variable>> {
        let variable = sqlx::query_as::<_, Variable>(&format!(
            "SELECT {} FROM variables WHERE project_id = ? AND name = ?",
            VARIABLE_COLUMNS
        ))
        .bind(project_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variable)
    }

    /// All variables of a project collapsed into name -> value
    pub async fn all_values(&self, project_id: &str) -> Result<BTreeMap<String, String>> {
        let pairs: Vec<(String, String)> =
            sqlx::query_as("SELECT name, value FROM variables WHERE project_id = ? ORDER BY name")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(pairs.into_iter().collect())
    }

    pub async fn update(&self, project_id: &str, id: &str, update: &VariableUpdate) -> Result<Option<Variable>> {
        let name = update.name.as_deref().map(str::trim);

        let result = sqlx::query(
            r#"
            UPDATE variables
            SET name = COALESCE(?, name),
                value = COALESCE(?, value),
                updated_at = ?
            WHERE id = ? AND project_id = ?
            "#,
        )
        .bind(name)
        .bind(&update.value)
        .bind(timestamp_now())
        .bind(id)
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(project_id, id).await
    }

    pub async fn delete(&self, project_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM variables WHERE id = ? AND project_id = ?")
            .bind(id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
