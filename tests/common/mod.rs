#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

use phrm_api::config::AppConfig;
use phrm_api::database::Database;
use phrm_api::state::AppState;

pub const PASSWORD: &str = "secret1";

/// The router served in-process on a free port, backed by a private
/// in-memory database
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::for_tests();
        config.api.host = "127.0.0.1".to_string();
        config.api.port = port;

        let db = Database::in_memory().await.context("failed to open test database")?;
        let state = AppState::new(config, db);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let app = phrm_api::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `path` is relative to `/api/v1`
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.api(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        self.client.post(self.api(path)).bearer_auth(token).json(body)
    }

    pub fn put(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        self.client.put(self.api(path)).bearer_auth(token).json(body)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.api(path)).bearer_auth(token)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Register `email` with [`PASSWORD`] and return the user payload
    pub async fn register(&self, email: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.api("/auth/register"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register {} gave {}", email, res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.api("/auth/login/json"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login {} gave {}", email, res.status());
        let body: Value = res.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access_token")
    }

    /// Register and log in; returns `(user id, token)`
    pub async fn sign_up(&self, email: &str) -> Result<(i64, String)> {
        let user = self.register(email).await?;
        let id = user["id"].as_i64().context("user payload has no id")?;
        let token = self.login(email).await?;
        Ok((id, token))
    }

    /// Create a family member and return its id
    pub async fn add_member(&self, token: &str, full_name: &str, relationship: &str) -> Result<i64> {
        let res = self
            .post(
                "/family-members",
                token,
                &json!({ "full_name": full_name, "relationship": relationship }),
            )
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "add member gave {}", res.status());
        data_id(res).await
    }
}

/// `data.id` of an enveloped response
pub async fn data_id(res: reqwest::Response) -> Result<i64> {
    let body: Value = res.json().await?;
    body["data"]["id"].as_i64().context("response has no data.id")
}
