#![allow(dead_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use starter_api::auth::SiteAdmins;
use starter_api::database::{MemoryStore, UserStore};
use starter_api::testing::{memory_app, StaticVerifier};
use tokio::net::TcpListener;

pub const U1_TOKEN: &str = "token-u1";
pub const U2_TOKEN: &str = "token-u2";
pub const ADMIN_TOKEN: &str = "token-admin";
pub const ANON_TOKEN: &str = "token-anon";
pub const NEWCOMER_TOKEN: &str = "token-newcomer";

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct TestServer {
    pub base_url: String,
    pub store: MemoryStore,
    client: Client,
}

impl TestServer {
    /// Start the real router in-process on a free port, over a fresh store
    /// seeded with users `u1`, `u2` and `admin`.
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = MemoryStore::new();
        store.ensure_exists("u1", Some("u1@example.com")).await?;
        store.ensure_exists("u2", Some("u2@example.com")).await?;
        store.ensure_exists("admin", Some(ADMIN_EMAIL)).await?;

        let verifier = StaticVerifier::new()
            .with_user(U1_TOKEN, "u1", Some("u1@example.com"))
            .with_user(U2_TOKEN, "u2", Some("u2@example.com"))
            .with_user(ADMIN_TOKEN, "admin", Some(ADMIN_EMAIL))
            .with_user(NEWCOMER_TOKEN, "newcomer", Some("new@example.com"))
            .with_anonymous(ANON_TOKEN, "anon");

        let app = memory_app(store.clone(), verifier, SiteAdmins::new([ADMIN_EMAIL]));

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            store,
            client: Client::new(),
        })
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.base_url, path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("{}{}", self.base_url, path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(format!("{}{}", self.base_url, path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(format!("{}{}", self.base_url, path))
    }

    /// Create a history through the API and return its id.
    pub async fn create_history(&self, token: &str, owner: &str, value: f64) -> Result<String> {
        let res = self
            .post(&format!("/api/v1/users/{}/histories", owner))
            .bearer_auth(token)
            .json(&serde_json::json!({ "datetime": "2024-01-01T00:00:00Z", "value": value }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == 201, "create failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["id"]
            .as_str()
            .map(str::to_string)
            .context("created history has no id")
    }

    /// Ensure-exists runs detached from the request, so poll for it.
    pub async fn wait_for_user(&self, id: &str) -> Result<bool> {
        for _ in 0..50 {
            if self.store.get(id).await?.is_some() {
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(false)
    }
}

pub fn assert_error_envelope(body: &Value) {
    assert_eq!(body["success"], Value::Bool(false), "expected error envelope: {}", body);
    assert!(body["error"].is_string(), "missing error message: {}", body);
    assert!(body.get("data").is_none(), "error envelope carries data: {}", body);
}

pub fn assert_success_envelope(body: &Value) {
    assert_eq!(body["success"], Value::Bool(true), "expected success envelope: {}", body);
    assert!(body.get("data").is_some(), "missing data field: {}", body);
}
