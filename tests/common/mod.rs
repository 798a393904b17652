#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use uuid::Uuid;

use hyfen_api::app::{app, AppState};
use hyfen_api::auth::{generate_jwt, Claims};
use hyfen_api::database::models::User;
use hyfen_api::database::{MemoryStore, UserStore};

/// The real router served on a free local port over a fresh `MemoryStore`.
/// Each test gets its own server, bound to that test's runtime.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

/// A seeded user and a bearer token for them.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let store = Arc::new(MemoryStore::new());
        let router = app(AppState::new(store.clone()));
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                eprintln!("test server stopped: {}", e);
            }
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
        })
    }

    pub async fn user(&self, name: &str, is_staff: bool) -> Result<TestUser> {
        let user = User {
            id: Uuid::new_v4(),
            username: format!("{}-{}", name, Uuid::new_v4().simple()),
            email: format!("{}@example.com", name),
            is_staff,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await?;
        let token = generate_jwt(&Claims::new(user.id, user.username, is_staff))?;
        Ok(TestUser { id: user.id, token })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn get_as(&self, user: &TestUser, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&user.token)
    }

    pub fn post_as(&self, user: &TestUser, path: &str, body: &Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&user.token).json(body)
    }

    pub fn patch_as(&self, user: &TestUser, path: &str, body: &Value) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(&user.token).json(body)
    }

    pub fn delete_as(&self, user: &TestUser, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(&user.token)
    }

    /// POST /api/v1/properties and return the created property.
    pub async fn create_property(&self, owner: &TestUser, body: Value) -> Result<Value> {
        let res = self.post_as(owner, "/api/v1/properties", &body).send().await?;
        anyhow::ensure!(res.status() == 201, "create property failed: {}", res.status());
        data(res).await
    }
}

/// Unwraps the `{"success": true, "data": ...}` envelope.
pub async fn data(res: Response) -> Result<Value> {
    let body = res.json::<Value>().await?;
    anyhow::ensure!(body["success"] == Value::Bool(true), "not a success envelope: {}", body);
    Ok(body["data"].clone())
}
