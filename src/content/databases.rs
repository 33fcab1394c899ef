/// SQLite persistence for schemaless project databases and their rows
///
/// Column lists and row payloads are stored as JSON text. Row lookups always
/// go through the owning database ID, and database lookups through the owning
/// project ID, so no query can cross a project boundary.

use crate::content::types::{Database, DatabaseRow, DatabaseUpdate, NewDatabase, RowData};
use crate::project::database::timestamp_now;
use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const DATABASE_COLUMNS: &str = "id, project_id, name, description, columns, created_at, updated_at";
const ROW_COLUMNS: &str = "id, database_id, data, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct DatabaseStorage {
    pool: SqlitePool,
}

impl DatabaseStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List a project's databases, newest first
    pub async fn list(&self, project_id: &str) -> Result<Vec<Database>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM databases WHERE project_id = ? ORDER BY created_at DESC, rowid DESC",
            DATABASE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(database_from_row).collect()
    }

    pub async fn create(&self, project_id: &str, request: &NewDatabase) -> Result<Database> {
        let now = timestamp_now();
        let database = Database {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            columns: request.columns.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO databases (id, project_id, name, description, columns, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&database.id)
        .bind(&database.project_id)
        .bind(&database.name)
        .bind(&database.description)
        .bind(serde_json::to_string(&database.columns)?)
        .bind(&database.created_at)
        .bind(&database.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(database)
    }

    /// Lookup by internal ID, scoped to the owning project
    pub async fn get(&self, project_id: &str, id: &str) -> Result<Option<Database>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM databases WHERE id = ? AND project_id = ?",
            DATABASE_COLUMNS
        ))
        .bind(id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(database_from_row).transpose()
    }

    /// Lookup by name; names are only unique per project
    pub async fn find_by_name(&self, project_id: &str, name: &str) -> Result<Option<Database>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM databases WHERE name = ? AND project_id = ?",
            DATABASE_COLUMNS
        ))
        .bind(name)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(database_from_row).transpose()
    }

    pub async fn update(&self, project_id: &str, id: &str, update: &DatabaseUpdate) -> Result<Option<Database>> {
        let name = update.name.as_deref().map(str::trim);
        let columns = update.columns.as_ref().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE databases
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                columns = COALESCE(?, columns),
                updated_at = ?
            WHERE id = ? AND project_id = ?
            "#,
        )
        .bind(name)
        .bind(&update.description)
        .bind(columns)
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

    /// Delete a database together with its rows
    pub async fn delete(&self, project_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM databases WHERE id = ? AND project_id = ?")
            .bind(id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rows of a database, newest first
    pub async fn list_rows(&self, database_id: &str) -> Result<Vec<DatabaseRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM database_rows WHERE database_id = ? ORDER BY created_at DESC, rowid DESC",
            ROW_COLUMNS
        ))
        .bind(database_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(database_row_from_row).collect()
    }

    pub async fn create_row(&self, database_id: &str, data: &RowData) -> Result<DatabaseRow> {
        let now = timestamp_now();
        let row = DatabaseRow {
            id: Uuid::new_v4().to_string(),
            database_id: database_id.to_string(),
            data: data.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO database_rows (id, database_id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.database_id)
        .bind(serde_json::to_string(&row.data)?)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_row(&self, database_id: &str, id: &str) -> Result<Option<DatabaseRow>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM database_rows WHERE id = ? AND database_id = ?",
            ROW_COLUMNS
        ))
        .bind(id)
        .bind(database_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(database_row_from_row).transpose()
    }

    /// Replace a row's data wholesale
    pub async fn update_row(&self, database_id: &str, id: &str, data: &RowData) -> Result<Option<DatabaseRow>> {
        let result = sqlx::query("UPDATE database_rows SET data = ?, updated_at = ? WHERE id = ? AND database_id = ?")
            .bind(serde_json::to_string(data)?)
            .bind(timestamp_now())
            .bind(id)
            .bind(database_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_row(database_id, id).await
    }

    pub async fn delete_row(&self, database_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM database_rows WHERE id = ? AND database_id = ?")
            .bind(id)
            .bind(database_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn database_from_row(row: &SqliteRow) -> Result<Database> {
    let columns_json: String = row.try_get("columns")?;
    Ok(Database {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        columns: serde_json::from_str(&columns_json)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn database_row_from_row(row: &SqliteRow) -> Result<DatabaseRow> {
    let data_json: String = row.try_get("data")?;
    Ok(DatabaseRow {
        id: row.try_get("id")?,
        database_id: row.try_get("database_id")?,
        data: serde_json::from_str(&data_json)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::project::{types::NewProject, DatabaseManager, ProjectStorage};

    async fn setup() -> (DatabaseStorage, ProjectStorage, String) {
        let config = DatabaseConfig { url: "sqlite::memory:".to_string() };
        let manager = DatabaseManager::connect(&config).await.unwrap();
        let projects = ProjectStorage::new(manager.pool());
        let owner = projects.create_owner("rows@example.com", "hash-rows").await.unwrap();
        let project = projects
            .create_project(&owner.id, &NewProject { name: "Rows".to_string(), description: None })
            .await
            .unwrap();
        (DatabaseStorage::new(manager.pool()), projects, project.id)
    }

    fn todo(title: &str) -> RowData {
        RowData::from([("title".to_string(), title.to_string())])
    }

    #[tokio::test]
    async fn rows_come_back_newest_first() {
        let (storage, _, project_id) = setup().await;
        let database = storage
            .create(
                &project_id,
                &NewDatabase { name: "todos".to_string(), description: None, columns: vec!["title".to_string()] },
            )
            .await
            .unwrap();

        let first = storage.create_row(&database.id, &todo("first")).await.unwrap();
        let second = storage.create_row(&database.id, &todo("second")).await.unwrap();

        let rows = storage.list_rows(&database.id).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn rows_tolerate_undeclared_columns() {
        let (storage, _, project_id) = setup().await;
        let database = storage
            .create(
                &project_id,
                &NewDatabase { name: "posts".to_string(), description: None, columns: vec!["title".to_string()] },
            )
            .await
            .unwrap();

        let mut data = todo("hello");
        data.insert("extra".to_string(), "kept".to_string());
        let row = storage.create_row(&database.id, &data).await.unwrap();

        let stored = storage.get_row(&database.id, &row.id).await.unwrap().unwrap();
        assert_eq!(stored.data.get("extra").map(String::as_str), Some("kept"));
    }

    #[tokio::test]
    async fn deleting_project_cascades_to_rows() {
        let (storage, projects, project_id) = setup().await;
        let database = storage
            .create(&project_id, &NewDatabase { name: "gone".to_string(), description: None, columns: vec![] })
            .await
            .unwrap();
        storage.create_row(&database.id, &todo("soon deleted")).await.unwrap();

        assert!(projects.delete_project(&project_id).await.unwrap());

        assert!(storage.list(&project_id).await.unwrap().is_empty());
        assert!(storage.list_rows(&database.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_unspecified_fields() {
        let (storage, _, project_id) = setup().await;
        let database = storage
            .create(
                &project_id,
                &NewDatabase {
                    name: "people".to_string(),
                    description: Some("contacts".to_string()),
                    columns: vec!["name".to_string()],
                },
            )
            .await
            .unwrap();

        let update = DatabaseUpdate { columns: Some(vec!["name".to_string(), "email".to_string()]), ..Default::default() };
        let updated = storage.update(&project_id, &database.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.name, "people");
        assert_eq!(updated.description.as_deref(), Some("contacts"));
        assert_eq!(updated.columns, vec!["name", "email"]);
    }
}
