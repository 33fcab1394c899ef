#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use catabasis::{
    api::auth::{generate_token, hash_token},
    build_router,
    config::{BuildHookConfig, DatabaseConfig},
    project::types::NewProject,
    AppState, DatabaseManager, Project,
};
use serde_json::Value;
use tokio::net::TcpListener;

/// In-process server backed by a private in-memory catalog
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub database: DatabaseManager,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let database = DatabaseManager::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        })
        .await?;
        let state = AppState::new(&database, &BuildHookConfig { timeout_secs: 5 })?;
        let app = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
            database,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an owner straight through storage; returns (owner_id, bearer token)
    pub async fn seed_owner(&self, email: &str) -> Result<(String, String)> {
        let token = generate_token();
        let owner = self.state.projects.create_owner(email, &hash_token(&token)).await?;
        Ok((owner.id, token))
    }

    /// Create a project and pin its public credentials to known values
    pub async fn seed_project(&self, owner_id: &str, site_uuid: &str, api_secret: &str) -> Result<Project> {
        let project = self
            .state
            .projects
            .create_project(
                owner_id,
                &NewProject {
                    name: format!("site {}", site_uuid),
                    description: None,
                },
            )
            .await?;

        sqlx::query("UPDATE projects SET site_uuid = ?, api_secret = ? WHERE id = ?")
            .bind(site_uuid)
            .bind(api_secret)
            .bind(&project.id)
            .execute(&self.database.pool())
            .await?;

        self.state
            .projects
            .get_project(&project.id)
            .await?
            .context("seeded project disappeared")
    }

    /// Poll the access log until `expected` entries exist for the project
    pub async fn wait_for_access_logs(&self, project_id: &str, expected: i64) -> Result<i64> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let count = self.state.access_logs.count(project_id).await?;
            if count >= expected || Instant::now() > deadline {
                return Ok(count);
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// One request captured by the hook receiver
#[derive(Debug, Clone)]
pub struct ReceivedHook {
    pub user_agent: Option<String>,
    pub body: Value,
}

/// Local endpoint standing in for a static-site host build hook
pub struct HookReceiver {
    pub url: String,
    received: Arc<Mutex<Vec<ReceivedHook>>>,
}

impl HookReceiver {
    pub async fn spawn() -> Result<Self> {
        let received: Arc<Mutex<Vec<ReceivedHook>>> = Arc::default();
        let app = Router::new()
            .route("/hook", post(record_hook))
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url: format!("http://{}/hook", addr),
            received,
        })
    }

    pub fn received(&self) -> Vec<ReceivedHook> {
        self.received.lock().map(|hooks| hooks.clone()).unwrap_or_default()
    }

    /// Poll until at least `expected` hooks arrived
    pub async fn wait_for(&self, expected: usize) -> Vec<ReceivedHook> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let hooks = self.received();
            if hooks.len() >= expected || Instant::now() > deadline {
                return hooks;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

async fn record_hook(
    State(received): State<Arc<Mutex<Vec<ReceivedHook>>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> &'static str {
    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    if let Ok(mut hooks) = received.lock() {
        hooks.push(ReceivedHook { user_agent, body });
    }
    "queued"
}
