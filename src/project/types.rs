/// Project type definitions for the multi-tenant catalog
///
/// A project is the tenant unit: it owns variables, databases and the API
/// secret that static sites present alongside the public site UUID.

use serde::{Deserialize, Serialize};

/// Authenticated management user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// A project container for variables and databases
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Internal identifier, never exposed to static sites
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Human-readable project name
    pub name: String,
    pub description: Option<String>,
    /// Public, non-secret identifier used in read API paths
    pub site_uuid: String,
    /// Private credential required alongside `site_uuid`
    pub api_secret: String,
    /// Deployment webhook invoked when project data changes
    pub build_hook_url: Option<String>,
    /// Whether data changes trigger the build hook automatically
    pub auto_deploy: bool,
    pub last_deploy_triggered: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for project creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial project update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Build hook settings as exposed to the management API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct BuildHookSettings {
    pub build_hook_url: Option<String>,
    pub auto_deploy: bool,
    #[serde(default, skip_deserializing)]
    pub last_deploy_triggered: Option<String>,
}

/// Identity resolved from a matching `(site_uuid, api_secret)` pair
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectCredentials {
    pub project_id: String,
    pub user_id: String,
}

/// One recorded public API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub project_id: String,
    pub endpoint: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Usage report line
#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct UsageEntry {
    pub endpoint: String,
    pub accessed_at: String,
}
