/// Catalog database manager
///
/// Owns the single SQLite pool that stores owners, projects, variables,
/// schemaless databases, access logs and build deployments.
/// Every child table references `projects(id)` with ON DELETE CASCADE, so
/// removing a project removes everything it owns.

use crate::config::DatabaseConfig;
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Catalog database manager with a shared connection pool
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open (and create if missing) the catalog database, then initialize the schema
    ///
    /// In-memory URLs get a single long-lived connection, since every SQLite
    /// memory connection is its own database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if let Some(path) = config.file_path() {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow::anyhow!("Failed to create database directory '{}': {}", parent.display(), e)
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if config.file_path().is_some() {
            tracing::info!("🗄️ Opening catalog database: {}", config.url);
            SqlitePoolOptions::new().connect_with(options).await?
        } else {
            tracing::info!("🗄️ Opening in-memory catalog database");
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        };

        let manager = Self { pool };
        manager.init_schema().await?;

        tracing::info!("✅ Catalog database ready");

        Ok(manager)
    }

    /// Shared pool handle for the storage layers
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Initialize catalog schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS owners (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                token_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                site_uuid TEXT NOT NULL UNIQUE,
                api_secret TEXT NOT NULL,
                build_hook_url TEXT,
                auto_deploy INTEGER NOT NULL DEFAULT 0,
                last_deploy_triggered TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS variables (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (project_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Column list is stored as a JSON array of strings
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS databases (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                columns TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (project_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS database_rows (
                id TEXT PRIMARY KEY,
                database_id TEXT NOT NULL REFERENCES databases(id) ON DELETE CASCADE,
                data TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_access_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                endpoint TEXT NOT NULL,
                ip_address TEXT,
                user_agent TEXT,
                accessed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS build_deployments (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                trigger_reason TEXT NOT NULL,
                trigger_details TEXT NOT NULL DEFAULT '{}',
                hook_url TEXT NOT NULL,
                status TEXT NOT NULL,
                response_status INTEGER,
                response_body TEXT,
                triggered_at TEXT NOT NULL,
                completed_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the public read paths
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_credentials ON projects(site_uuid, api_secret)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_rows_database ON database_rows(database_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_access_logs_project ON api_access_logs(project_id, accessed_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_deployments_project ON build_deployments(project_id, triggered_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Current UTC time as a fixed-width RFC 3339 string
///
/// Microsecond precision with a `Z` suffix keeps lexical order equal to
/// chronological order, which the newest-first queries rely on.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
