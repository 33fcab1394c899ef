/// Project management module
///
/// Handles owners, projects, the catalog database and the access log.
/// Each project is isolated by its internal ID; the public read API reaches a
/// project only through its `(site_uuid, api_secret)` pair.

pub mod access_log;
pub mod database;
pub mod storage;
pub mod types;

pub use access_log::AccessLogStorage;
pub use database::DatabaseManager;
pub use storage::ProjectStorage;
pub use types::{Owner, Project};
