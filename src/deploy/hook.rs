/// Build hook delivery
///
/// Records a deployment, POSTs to the project's hook URL in a detached task,
/// and writes back the outcome. Content mutations never wait on delivery and
/// never fail because of it.

use crate::config::BuildHookConfig;
use crate::deploy::{
    storage::DeploymentStorage,
    types::{DeploymentStatus, HookTestResult, TriggerReason},
};
use crate::error::ApiError;
use crate::project::{database::timestamp_now, ProjectStorage};
use anyhow::Result;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::task::JoinHandle;

const HOOK_USER_AGENT: &str = "Catabasis-BuildHook/1.0";
const TEST_USER_AGENT: &str = "Catabasis-BuildHook-Test/1.0";

/// Stored response bodies are cut to this many characters
const MAX_RESPONSE_BODY: usize = 2000;

/// A deployment whose delivery is in flight
#[derive(Debug)]
pub struct Dispatch {
    pub deployment_id: String,
    /// Delivery task; dropping it does not cancel delivery
    pub delivery: JoinHandle<()>,
}

#[derive(Debug, Clone)]
pub struct BuildHookService {
    projects: ProjectStorage,
    deployments: DeploymentStorage,
    client: reqwest::Client,
}

impl BuildHookService {
    pub fn new(projects: ProjectStorage, deployments: DeploymentStorage, config: &BuildHookConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { projects, deployments, client })
    }

    pub fn deployments(&self) -> &DeploymentStorage {
        &self.deployments
    }

    /// Record and dispatch a deployment for a project
    ///
    /// Returns None when the project has no hook URL, or when an automatic
    /// reason fires while auto-deploy is off.
    pub async fn trigger(&self, project_id: &str, reason: TriggerReason, details: Value) -> Result<Option<Dispatch>> {
        let settings = self
            .projects
            .build_hook_settings(project_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Project not found: {}", project_id))?;

        let hook_url = match settings.build_hook_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                tracing::debug!("⏭️ No build hook configured for project {}", project_id);
                return Ok(None);
            }
        };

        if reason.is_automatic() && !settings.auto_deploy {
            tracing::debug!("⏭️ Auto-deploy disabled for project {}, skipping {}", project_id, reason);
            return Ok(None);
        }

        let deployment = self
            .deployments
            .create_pending(project_id, reason, &details, &hook_url)
            .await?;
        self.projects
            .mark_deploy_triggered(project_id, &deployment.triggered_at)
            .await?;

        tracing::info!("🚀 Build hook triggered for project {} ({}): {}", project_id, reason, deployment.id);

        let payload = json!({
            "reason": reason,
            "details": details,
            "timestamp": timestamp_now(),
        });

        let service = self.clone();
        let deployment_id = deployment.id.clone();
        let delivery = tokio::spawn(async move {
            service.deliver(&deployment_id, &hook_url, &payload).await;
        });

        Ok(Some(Dispatch { deployment_id: deployment.id, delivery }))
    }

    /// Trigger from a content mutation without holding up the caller
    ///
    /// Failures are logged and dropped.
    pub fn notify(&self, project_id: &str, reason: TriggerReason, details: Value) -> JoinHandle<()> {
        let service = self.clone();
        let project_id = project_id.to_string();
        tokio::spawn(async move {
            match service.trigger(&project_id, reason, details).await {
                Ok(Some(dispatch)) => {
                    if let Err(e) = dispatch.delivery.await {
                        tracing::warn!("⚠️ Build hook delivery task failed for {}: {}", dispatch.deployment_id, e);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("⚠️ Build hook failed for project {}: {}", project_id, e),
            }
        })
    }

    /// POST the payload and record success or failure
    async fn deliver(&self, deployment_id: &str, hook_url: &str, payload: &Value) {
        let outcome = self
            .client
            .post(hook_url)
            .header("User-Agent", HOOK_USER_AGENT)
            .json(payload)
            .send()
            .await;

        let recorded = match outcome {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let body: String = body.chars().take(MAX_RESPONSE_BODY).collect();

                if status.is_success() {
                    tracing::info!("✅ Build hook delivered: {} (status: {})", deployment_id, status);
                } else {
                    tracing::warn!("❌ Build hook returned status {} for {}", status, deployment_id);
                }

                let final_status = if status.is_success() {
                    DeploymentStatus::Success
                } else {
                    DeploymentStatus::Failed
                };
                self.deployments
                    .complete(deployment_id, final_status, Some(status.as_u16()), Some(&body))
                    .await
            }
            Err(e) => {
                tracing::warn!("❌ Build hook request failed for {}: {}", deployment_id, e);
                self.deployments
                    .complete(deployment_id, DeploymentStatus::Failed, None, Some(&e.to_string()))
                    .await
            }
        };

        if let Err(e) = recorded {
            tracing::error!("Failed to record build hook outcome for {}: {}", deployment_id, e);
        }
    }

    /// Send a test request to a candidate hook URL
    pub async fn test(&self, hook_url: &str) -> HookTestResult {
        let payload = json!({
            "test": true,
            "timestamp": timestamp_now(),
            "source": "catabasis_test",
        });

        match self
            .client
            .post(hook_url)
            .header("User-Agent", TEST_USER_AGENT)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => HookTestResult {
                success: true,
                message: "Build hook test successful".to_string(),
            },
            Ok(response) => HookTestResult {
                success: false,
                message: format!("Build hook returned status {}", response.status().as_u16()),
            },
            Err(e) => HookTestResult {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Accept only absolute http(s) URLs as hook targets
pub fn validate_hook_url(raw: &str) -> Result<String, ApiError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ApiError::bad_request(format!("Invalid build hook URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(ApiError::bad_request(format!(
            "Invalid build hook URL: unsupported scheme '{}'",
            other
        ))),
    }
}
