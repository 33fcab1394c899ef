/// SQLite persistence for build deployments

use crate::deploy::types::{BuildDeployment, DeploymentStatus, TriggerReason};
use crate::project::database::timestamp_now;
use anyhow::Result;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DeploymentStorage {
    pool: SqlitePool,
}

impl DeploymentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a pending deployment and return it
    pub async fn create_pending(
        &self,
        project_id: &str,
        reason: TriggerReason,
        details: &Value,
        hook_url: &str,
    ) -> Result<BuildDeployment> {
        let deployment = BuildDeployment {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            trigger_reason: reason.as_str().to_string(),
            trigger_details: details.clone(),
            hook_url: hook_url.to_string(),
            status: DeploymentStatus::Pending.as_str().to_string(),
            response_status: None,
            response_body: None,
            triggered_at: timestamp_now(),
            completed_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO build_deployments (id, project_id, trigger_reason, trigger_details, hook_url, status, triggered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&deployment.id)
        .bind(&deployment.project_id)
        .bind(&deployment.trigger_reason)
        .bind(serde_json::to_string(&deployment.trigger_details)?)
        .bind(&deployment.hook_url)
        .bind(&deployment.status)
        .bind(&deployment.triggered_at)
        .execute(&self.pool)
        .await?;

        Ok(deployment)
    }

    /// Record the final outcome of a deployment
    pub async fn complete(
        &self,
        id: &str,
        status: DeploymentStatus,
        response_status: Option<u16>,
        response_body: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE build_deployments
            SET status = ?, response_status = ?, response_body = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(response_status.map(i64::from))
        .bind(response_body)
        .bind(timestamp_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Single deployment by id, whichever project it belongs to
    pub async fn get(&self, id: &str) -> Result<Option<BuildDeployment>> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, trigger_reason, trigger_details, hook_url, status,
                   response_status, response_body, triggered_at, completed_at
            FROM build_deployments WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(deployment_from_row).transpose()
    }

    /// Most recent deployments of a project, newest first
    pub async fn history(&self, project_id: &str, limit: u32) -> Result<Vec<BuildDeployment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, trigger_reason, trigger_details, hook_url, status,
                   response_status, response_body, triggered_at, completed_at
            FROM build_deployments
            WHERE project_id = ?
            ORDER BY triggered_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(project_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(deployment_from_row).collect()
    }
}

fn deployment_from_row(row: &SqliteRow) -> Result<BuildDeployment> {
    let details_json: String = row.try_get("trigger_details")?;
    Ok(BuildDeployment {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        trigger_reason: row.try_get("trigger_reason")?,
        trigger_details: serde_json::from_str(&details_json)?,
        hook_url: row.try_get("hook_url")?,
        status: row.try_get("status")?,
        response_status: row.try_get("response_status")?,
        response_body: row.try_get("response_body")?,
        triggered_at: row.try_get("triggered_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}
