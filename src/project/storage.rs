/// SQLite persistence layer for owners and projects
///
/// Also hosts the credential lookup used by the public read API: a single
/// statement matching `site_uuid` and `api_secret` together.

use crate::project::{
    database::timestamp_now,
    types::{BuildHookSettings, NewProject, Owner, Project, ProjectCredentials, ProjectUpdate},
};
use anyhow::Result;
use rand::RngCore;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

const PROJECT_COLUMNS: &str = "id, user_id, name, description, site_uuid, api_secret, \
     build_hook_url, auto_deploy, last_deploy_triggered, created_at, updated_at";

/// SQLite-based project storage
#[derive(Debug, Clone)]
pub struct ProjectStorage {
    pool: SqlitePool,
}

impl ProjectStorage {
    /// Create new storage instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an owner; only the token hash is persisted
    pub async fn create_owner(&self, email: &str, token_hash: &str) -> Result<Owner> {
        let owner = Owner {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: timestamp_now(),
        };

        sqlx::query("INSERT INTO owners (id, email, token_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(&owner.id)
            .bind(&owner.email)
            .bind(token_hash)
            .bind(&owner.created_at)
            .execute(&self.pool)
            .await?;

        Ok(owner)
    }

    /// Resolve a bearer token hash to its owner
    pub async fn find_owner_by_token_hash(&self, token_hash: &str) -> Result<Option<Owner>> {
        let row = sqlx::query("SELECT id, email, created_at FROM owners WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Owner {
            id: row.get("id"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        }))
    }

    /// Create a project with a fresh site UUID and API secret
    pub async fn create_project(&self, owner_id: &str, request: &NewProject) -> Result<Project> {
        let now = timestamp_now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            user_id: owner_id.to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            site_uuid: Uuid::new_v4().to_string(),
            api_secret: generate_api_secret(),
            build_hook_url: None,
            auto_deploy: false,
            last_deploy_triggered: None,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO projects (id, user_id, name, description, site_uuid, api_secret, auto_deploy, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.user_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.site_uuid)
        .bind(&project.api_secret)
        .bind(&project.created_at)
        .bind(&project.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(project)
    }

    /// List an owner's projects, newest first
    pub async fn list_projects(&self, owner_id: &str) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Retrieve a project by internal ID
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    /// Retrieve a project only if it belongs to the given owner
    pub async fn get_owned_project(&self, owner_id: &str, id: &str) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = ? AND user_id = ?",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    /// Apply a partial update and return the refreshed project
    pub async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<Option<Project>> {
        let name = update.name.as_deref().map(str::trim);

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(&update.description)
        .bind(timestamp_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    /// Delete a project; child rows go with it through ON DELETE CASCADE
    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the project's API secret; the previous one stops working immediately
    pub async fn regenerate_secret(&self, id: &str) -> Result<Option<Project>> {
        let result = sqlx::query("UPDATE projects SET api_secret = ?, updated_at = ? WHERE id = ?")
            .bind(generate_api_secret())
            .bind(timestamp_now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    /// Match site UUID and secret in one statement
    pub async fn find_by_credentials(&self, site_uuid: &str, api_secret: &str) -> Result<Option<ProjectCredentials>> {
        let credentials = sqlx::query_as::<_, ProjectCredentials>(
            "SELECT id AS project_id, user_id FROM projects WHERE site_uuid = ? AND api_secret = ?",
        )
        .bind(site_uuid)
        .bind(api_secret)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn build_hook_settings(&self, id: &str) -> Result<Option<BuildHookSettings>> {
        let settings = sqlx::query_as::<_, BuildHookSettings>(
            "SELECT build_hook_url, auto_deploy, last_deploy_triggered FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    pub async fn update_build_hook_settings(
        &self,
        id: &str,
        build_hook_url: Option<&str>,
        auto_deploy: bool,
    ) -> Result<Option<BuildHookSettings>> {
        let result = sqlx::query(
            "UPDATE projects SET build_hook_url = ?, auto_deploy = ?, updated_at = ? WHERE id = ?",
        )
        .bind(build_hook_url)
        .bind(auto_deploy)
        .bind(timestamp_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.build_hook_settings(id).await
    }

    /// Stamp the time of the most recent hook dispatch
    pub async fn mark_deploy_triggered(&self, id: &str, triggered_at: &str) -> Result<()> {
        sqlx::query("UPDATE projects SET last_deploy_triggered = ? WHERE id = ?")
            .bind(triggered_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// 32 random bytes, hex encoded
pub fn generate_api_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
