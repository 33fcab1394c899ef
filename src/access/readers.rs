/// Variable and database readers for the public read API
///
/// Each operation validates credentials before touching content, then scopes
/// every lookup to the resolved project. A database that exists under another
/// project is reported as not found, never as a credential failure.

use crate::access::credentials::CredentialValidator;
use crate::content::{DatabaseRow, DatabaseStorage, RowData, VariableStorage};
use crate::error::ApiError;
use crate::project::types::ProjectCredentials;
use serde::Serialize;
use std::collections::BTreeMap;

/// Read result paired with the project it was resolved against
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub project: ProjectCredentials,
    pub data: T,
}

/// Public shape of a single variable
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VariableValue {
    pub key: String,
    pub value: String,
}

/// Public shape of a database row
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicRow {
    pub id: String,
    pub data: RowData,
    pub created_at: String,
}

impl From<DatabaseRow> for PublicRow {
    fn from(row: DatabaseRow) -> Self {
        Self {
            id: row.id,
            data: row.data,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DatabaseRef {
    pub id: String,
    pub name: String,
}

/// Rows of a database addressed by internal ID
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseById {
    pub database: DatabaseRef,
    pub rows: Vec<PublicRow>,
}

/// Rows of a database addressed by name
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseByName {
    pub database: String,
    pub rows: Vec<PublicRow>,
}

#[derive(Debug, Clone)]
pub struct VariableReader {
    validator: CredentialValidator,
    variables: VariableStorage,
}

impl VariableReader {
    pub fn new(validator: CredentialValidator, variables: VariableStorage) -> Self {
        Self { validator, variables }
    }

    /// Single variable by exact name
    pub async fn get_variable(
        &self,
        site_uuid: &str,
        api_secret: &str,
        name: &str,
    ) -> Result<Resolved<VariableValue>, ApiError> {
        let project = self.validator.validate(site_uuid, api_secret).await?;

        let variable = self
            .variables
            .find_by_name(&project.project_id, name)
            .await?
            .ok_or_else(|| ApiError::not_found("Variable not found"))?;

        Ok(Resolved {
            project,
            data: VariableValue { key: variable.name, value: variable.value },
        })
    }

    /// Every variable of the project as name -> value
    pub async fn get_all_variables(
        &self,
        site_uuid: &str,
        api_secret: &str,
    ) -> Result<Resolved<BTreeMap<String, String>>, ApiError> {
        let project = self.validator.validate(site_uuid, api_secret).await?;
        let data = self.variables.all_values(&project.project_id).await?;

        Ok(Resolved { project, data })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseReader {
    validator: CredentialValidator,
    databases: DatabaseStorage,
}

impl DatabaseReader {
    pub fn new(validator: CredentialValidator, databases: DatabaseStorage) -> Self {
        Self { validator, databases }
    }

    /// Rows of a database addressed by internal ID
    pub async fn get_database_data(
        &self,
        site_uuid: &str,
        api_secret: &str,
        database_id: &str,
    ) -> Result<Resolved<DatabaseById>, ApiError> {
        let project = self.validator.validate(site_uuid, api_secret).await?;

        let database = self
            .databases
            .get(&project.project_id, database_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Database not found"))?;
        let rows = self.public_rows(&database.id).await?;

        Ok(Resolved {
            project,
            data: DatabaseById {
                database: DatabaseRef { id: database.id, name: database.name },
                rows,
            },
        })
    }

    /// Rows of a database addressed by its project-scoped name
    pub async fn get_database_data_by_name(
        &self,
        site_uuid: &str,
        api_secret: &str,
        name: &str,
    ) -> Result<Resolved<DatabaseByName>, ApiError> {
        let project = self.validator.validate(site_uuid, api_secret).await?;

        let database = self
            .databases
            .find_by_name(&project.project_id, name)
            .await?
            .ok_or_else(|| ApiError::not_found("Database not found"))?;
        let rows = self.public_rows(&database.id).await?;

        Ok(Resolved {
            project,
            data: DatabaseByName { database: database.name, rows },
        })
    }

    async fn public_rows(&self, database_id: &str) -> Result<Vec<PublicRow>, ApiError> {
        let rows = self.databases.list_rows(database_id).await?;
        Ok(rows.into_iter().map(PublicRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::content::types::{NewDatabase, NewVariable};
    use crate::project::{types::NewProject, DatabaseManager, Project, ProjectStorage};

    struct Fixture {
        variables: VariableReader,
        databases: DatabaseReader,
        variable_storage: VariableStorage,
        database_storage: DatabaseStorage,
        first: Project,
        second: Project,
    }

    async fn fixture() -> Fixture {
        let config = DatabaseConfig { url: "sqlite::memory:".to_string() };
        let manager = DatabaseManager::connect(&config).await.unwrap();
        let projects = ProjectStorage::new(manager.pool());
        let owner = projects.create_owner("reader@example.com", "hash-reader").await.unwrap();
        let first = projects
            .create_project(&owner.id, &NewProject { name: "First".to_string(), description: None })
            .await
            .unwrap();
        let second = projects
            .create_project(&owner.id, &NewProject { name: "Second".to_string(), description: None })
            .await
            .unwrap();

        let validator = CredentialValidator::new(projects);
        let variable_storage = VariableStorage::new(manager.pool());
        let database_storage = DatabaseStorage::new(manager.pool());

        Fixture {
            variables: VariableReader::new(validator.clone(), variable_storage.clone()),
            databases: DatabaseReader::new(validator, database_storage.clone()),
            variable_storage,
            database_storage,
            first,
            second,
        }
    }

    #[tokio::test]
    async fn all_variables_match_stored_set() {
        let fx = fixture().await;
        for (name, value) in [("greeting", "hi"), ("title", "Home")] {
            fx.variable_storage
                .create(&fx.first.id, &NewVariable { name: name.to_string(), value: value.to_string() })
                .await
                .unwrap();
        }
        fx.variable_storage
            .create(&fx.second.id, &NewVariable { name: "other".to_string(), value: "x".to_string() })
            .await
            .unwrap();

        let resolved = fx
            .variables
            .get_all_variables(&fx.first.site_uuid, &fx.first.api_secret)
            .await
            .unwrap();

        assert_eq!(resolved.project.project_id, fx.first.id);
        assert_eq!(
            resolved.data,
            BTreeMap::from([
                ("greeting".to_string(), "hi".to_string()),
                ("title".to_string(), "Home".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn wrong_secret_fails_every_read() {
        let fx = fixture().await;
        let site = fx.first.site_uuid.as_str();

        assert!(matches!(
            fx.variables.get_variable(site, "nope", "greeting").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            fx.variables.get_all_variables(site, "nope").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            fx.databases.get_database_data_by_name(site, "nope", "todos").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            fx.databases.get_database_data(site, "nope", "some-id").await,
            Err(ApiError::InvalidCredentials)
        ));
        // A secret from a different project is still wrong for this site
        assert!(matches!(
            fx.variables.get_all_variables(site, &fx.second.api_secret).await,
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn foreign_database_is_not_found() {
        let fx = fixture().await;
        let foreign = fx
            .database_storage
            .create(&fx.second.id, &NewDatabase { name: "todos".to_string(), description: None, columns: vec![] })
            .await
            .unwrap();

        let by_name = fx
            .databases
            .get_database_data_by_name(&fx.first.site_uuid, &fx.first.api_secret, "todos")
            .await;
        assert!(matches!(by_name, Err(ApiError::NotFound(_))));

        let by_id = fx
            .databases
            .get_database_data(&fx.first.site_uuid, &fx.first.api_secret, &foreign.id)
            .await;
        assert!(matches!(by_id, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_database_is_not_an_error() {
        let fx = fixture().await;
        let database = fx
            .database_storage
            .create(&fx.first.id, &NewDatabase { name: "todos".to_string(), description: None, columns: vec![] })
            .await
            .unwrap();

        let by_name = fx
            .databases
            .get_database_data_by_name(&fx.first.site_uuid, &fx.first.api_secret, "todos")
            .await
            .unwrap();
        assert_eq!(by_name.data.database, "todos");
        assert!(by_name.data.rows.is_empty());

        let by_id = fx
            .databases
            .get_database_data(&fx.first.site_uuid, &fx.first.api_secret, &database.id)
            .await
            .unwrap();
        assert_eq!(by_id.data.database, DatabaseRef { id: database.id, name: "todos".to_string() });
    }
}
