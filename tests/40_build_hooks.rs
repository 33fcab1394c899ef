mod common;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{HookReceiver, TestServer};

struct Fixture {
    server: TestServer,
    token: String,
    project_id: String,
}

async fn fixture() -> Result<Fixture> {
    let server = TestServer::spawn().await?;
    let (owner_id, token) = server.seed_owner("owner@example.com").await?;
    let project = server.seed_project(&owner_id, "site-1", "secret-1").await?;
    Ok(Fixture {
        server,
        token,
        project_id: project.id,
    })
}

impl Fixture {
    async fn configure(&self, hook_url: Option<&str>, auto_deploy: bool) -> Result<Value> {
        let res = self
            .server
            .client
            .put(self.server.url(&format!("/api/projects/{}/build-hook", self.project_id)))
            .bearer_auth(&self.token)
            .json(&json!({ "build_hook_url": hook_url, "auto_deploy": auto_deploy }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }

    async fn history(&self) -> Result<Vec<Value>> {
        let body: Value = self
            .server
            .client
            .get(self.server.url(&format!("/api/projects/{}/deployments", self.project_id)))
            .bearer_auth(&self.token)
            .send()
            .await?
            .json()
            .await?;
        body["data"].as_array().cloned().context("history is not a list")
    }

    /// Poll until the newest deployment leaves the pending state
    async fn settled_history(&self) -> Result<Vec<Value>> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let history = self.history().await?;
            let settled = history.first().is_some_and(|d| d["status"] != "pending");
            if settled || Instant::now() > deadline {
                return Ok(history);
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

#[tokio::test]
async fn settings_round_trip_and_reject_bad_urls() -> Result<()> {
    let fx = fixture().await?;

    let settings = fx.configure(Some("https://api.netlify.com/build_hooks/abc"), true).await?;
    assert_eq!(settings["build_hook_url"], "https://api.netlify.com/build_hooks/abc");
    assert_eq!(settings["auto_deploy"], true);

    let res = fx
        .server
        .client
        .put(fx.server.url(&format!("/api/projects/{}/build-hook", fx.project_id)))
        .bearer_auth(&fx.token)
        .json(&json!({ "build_hook_url": "ftp://example.com/hook", "auto_deploy": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let cleared = fx.configure(Some("  "), false).await?;
    assert_eq!(cleared["build_hook_url"], Value::Null);
    assert_eq!(cleared["auto_deploy"], false);
    Ok(())
}

#[tokio::test]
async fn variable_change_fires_hook_when_auto_deploy_is_on() -> Result<()> {
    let fx = fixture().await?;
    let receiver = HookReceiver::spawn().await?;
    fx.configure(Some(receiver.url.as_str()), true).await?;

    let res = fx
        .server
        .client
        .post(fx.server.url(&format!("/api/projects/{}/variables", fx.project_id)))
        .bearer_auth(&fx.token)
        .json(&json!({ "name": "banner", "value": "Sale" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let hooks = receiver.wait_for(1).await;
    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks[0].user_agent.as_deref(), Some("Catabasis-BuildHook/1.0"));
    assert_eq!(hooks[0].body["reason"], "variable_update");
    assert_eq!(hooks[0].body["details"]["variable"]["name"], "banner");

    let history = fx.settled_history().await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["trigger_reason"], "variable_update");
    assert_eq!(history[0]["status"], "success");
    assert_eq!(history[0]["response_status"], 200);
    assert_eq!(history[0]["response_body"], "queued");

    let settings: Value = fx
        .server
        .client
        .get(fx.server.url(&format!("/api/projects/{}/build-hook", fx.project_id)))
        .bearer_auth(&fx.token)
        .send()
        .await?
        .json()
        .await?;
    assert!(settings["data"]["last_deploy_triggered"].is_string());
    Ok(())
}

#[tokio::test]
async fn content_changes_are_quiet_when_auto_deploy_is_off() -> Result<()> {
    let fx = fixture().await?;
    let receiver = HookReceiver::spawn().await?;
    fx.configure(Some(receiver.url.as_str()), false).await?;

    let res = fx
        .server
        .client
        .post(fx.server.url(&format!("/api/projects/{}/variables", fx.project_id)))
        .bearer_auth(&fx.token)
        .json(&json!({ "name": "banner", "value": "Sale" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(receiver.received().is_empty());
    assert!(fx.history().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn manual_trigger_ignores_auto_deploy() -> Result<()> {
    let fx = fixture().await?;
    let receiver = HookReceiver::spawn().await?;
    fx.configure(Some(receiver.url.as_str()), false).await?;

    let res = fx
        .server
        .client
        .post(fx.server.url(&format!("/api/projects/{}/build-hook/trigger", fx.project_id)))
        .bearer_auth(&fx.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let deployment_id = body["data"]["deployment_id"].as_str().unwrap_or_default().to_string();
    assert!(!deployment_id.is_empty());

    let hooks = receiver.wait_for(1).await;
    assert_eq!(hooks[0].body["reason"], "manual");

    let history = fx.settled_history().await?;
    assert_eq!(history[0]["id"], deployment_id.as_str());
    assert_eq!(history[0]["status"], "success");
    Ok(())
}

#[tokio::test]
async fn manual_trigger_without_hook_is_rejected() -> Result<()> {
    let fx = fixture().await?;

    let res = fx
        .server
        .client
        .post(fx.server.url(&format!("/api/projects/{}/build-hook/trigger", fx.project_id)))
        .bearer_auth(&fx.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "No build hook configured for this project");
    Ok(())
}

#[tokio::test]
async fn unreachable_hook_is_recorded_as_failed() -> Result<()> {
    let fx = fixture().await?;
    // Bind then drop a listener to get a port nobody answers on
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
    fx.configure(Some(format!("http://{}/hook", closed).as_str()), false).await?;

    let res = fx
        .server
        .client
        .post(fx.server.url(&format!("/api/projects/{}/build-hook/trigger", fx.project_id)))
        .bearer_auth(&fx.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let history = fx.settled_history().await?;
    assert_eq!(history[0]["status"], "failed");
    assert_eq!(history[0]["response_status"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn hook_test_endpoint_reports_outcome() -> Result<()> {
    let fx = fixture().await?;
    let receiver = HookReceiver::spawn().await?;

    let res = fx
        .server
        .client
        .post(fx.server.url("/api/build-hooks/test"))
        .bearer_auth(&fx.token)
        .json(&json!({ "url": receiver.url }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"], json!({ "success": true, "message": "Build hook test successful" }));

    let hooks = receiver.wait_for(1).await;
    assert_eq!(hooks[0].user_agent.as_deref(), Some("Catabasis-BuildHook-Test/1.0"));
    assert_eq!(hooks[0].body["test"], true);
    assert_eq!(hooks[0].body["source"], "catabasis_test");

    // Test requests never create deployment records
    assert!(fx.history().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn triggered_deployment_can_be_looked_up() -> Result<()> {
    let fx = fixture().await?;
    let receiver = HookReceiver::spawn().await?;
    fx.configure(Some(receiver.url.as_str()), false).await?;

    let body: Value = fx
        .server
        .client
        .post(fx.server.url(&format!("/api/projects/{}/build-hook/trigger", fx.project_id)))
        .bearer_auth(&fx.token)
        .send()
        .await?
        .json()
        .await?;
    let deployment_id = body["data"]["deployment_id"].as_str().unwrap_or_default().to_string();
    fx.settled_history().await?;

    let res = fx
        .server
        .client
        .get(fx.server.url(&format!("/api/projects/{}/deployments/{}", fx.project_id, deployment_id)))
        .bearer_auth(&fx.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["id"], deployment_id.as_str());
    assert_eq!(body["data"]["trigger_reason"], "manual");
    assert_eq!(body["data"]["status"], "success");

    // A deployment id from another project is reported as missing
    let (other_owner, other_token) = fx.server.seed_owner("other@example.com").await?;
    let other = fx.server.seed_project(&other_owner, "site-2", "secret-2").await?;
    let res = fx
        .server
        .client
        .get(fx.server.url(&format!("/api/projects/{}/deployments/{}", other.id, deployment_id)))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Deployment not found");
    Ok(())
}
