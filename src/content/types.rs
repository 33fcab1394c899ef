/// Project content type definitions
///
/// Variables are named strings; databases are named tables whose rows are
/// schemaless string maps. Declared columns describe the expected row shape
/// but are never enforced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row payload: column name -> string value
pub type RowData = BTreeMap<String, String>;

/// Named string value scoped to a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Variable {
    pub id: String,
    pub project_id: String,
    /// Unique within the project
    pub name: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariableUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Project-scoped named table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    pub id: String,
    pub project_id: String,
    /// Unique within the project
    pub name: String,
    pub description: Option<String>,
    /// Ordered column names
    pub columns: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDatabase {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// One row of a schemaless database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseRow {
    pub id: String,
    pub database_id: String,
    pub data: RowData,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for row creation and replacement
#[derive(Debug, Clone, Deserialize)]
pub struct RowPayload {
    pub data: RowData,
}
