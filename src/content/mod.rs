/// Project content layer
///
/// Variables and schemaless databases owned by a project:
/// - Type definitions (Variable, Database, DatabaseRow)
/// - SQLite persistence with sqlx

pub mod databases;
pub mod types;
pub mod variables;

pub use databases::DatabaseStorage;
pub use types::{Database, DatabaseRow, RowData, Variable};
pub use variables::VariableStorage;
