//! Shared helpers for HTTP-level tests.

#![allow(dead_code)]

use license_key_server::{build_router, build_state, config::Config};
use tempfile::TempDir;

pub const ADMIN_SECRET: &str = "integration-secret";

/// A running server backed by a store file in its own temp directory.
pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub dir: TempDir,
}

impl TestServer {
    pub fn store_path(&self) -> std::path::PathBuf {
        self.dir.path().join("keys.json")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn generate(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/keys/generate"))
            .bearer_auth(ADMIN_SECRET)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn validate(&self, key: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/keys/validate"))
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await
            .unwrap()
    }

    pub async fn deactivate(&self, key: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/keys/deactivate"))
            .bearer_auth(ADMIN_SECRET)
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await
            .unwrap()
    }
}

/// Spin up the HTTP server on an OS-assigned port.
pub async fn spawn_test_server() -> TestServer {
    spawn_with_store(None, true).await
}

/// Spin up the server, optionally seeding the store file with `contents` first.
pub async fn spawn_with_store(contents: Option<&str>, fail_open: bool) -> TestServer {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    if let Some(contents) = contents {
        std::fs::write(&path, contents).unwrap();
    }

    let config = Config::from_vars(vec![
        ("ADMIN_SECRET".to_string(), ADMIN_SECRET.to_string()),
        ("KEY_STORE_PATH".to_string(), path.display().to_string()),
        ("STORE_FAIL_OPEN".to_string(), fail_open.to_string()),
    ])
    .unwrap();

    let app = build_router(build_state(&config).await.unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        dir,
    }
}
