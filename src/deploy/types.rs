/// Build deployment type definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Why a build hook fired
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    VariableUpdate,
    DatabaseUpdate,
    Manual,
}

impl TriggerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerReason::VariableUpdate => "variable_update",
            TriggerReason::DatabaseUpdate => "database_update",
            TriggerReason::Manual => "manual",
        }
    }

    /// Automatic reasons only fire when the project has auto-deploy enabled
    pub fn is_automatic(&self) -> bool {
        !matches!(self, TriggerReason::Manual)
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Success,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        }
    }
}

/// One recorded build hook invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDeployment {
    pub id: String,
    pub project_id: String,
    /// Stored as text so rows written by older versions still load
    pub trigger_reason: String,
    pub trigger_details: Value,
    pub hook_url: String,
    pub status: String,
    pub response_status: Option<i64>,
    pub response_body: Option<String>,
    pub triggered_at: String,
    pub completed_at: Option<String>,
}

/// Outcome of a build hook test request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookTestResult {
    pub success: bool,
    pub message: String,
}
