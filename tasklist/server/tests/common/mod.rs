#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::sync::Arc;
use tasklist_server::config::{Config, StorageBackend};
use tasklist_server::storage::InMemoryBlobStore;
use tower::ServiceExt;

pub const STORAGE_KEY: &str = "tasks.json";

/// Configuration for in-process tests: memory storage, no retry delay.
pub fn test_config() -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        storage_key: STORAGE_KEY.to_string(),
        storage_retry_delay_ms: 0,
        ..Config::default()
    }
}

/// Builds the application over a fresh in-memory store.
pub fn create_test_app(config: &Config) -> (Router, Arc<InMemoryBlobStore>) {
    let store = Arc::new(InMemoryBlobStore::new());
    let app = tasklist_server::web::create_app(config, store.clone()).unwrap();
    (app, store)
}

/// A response read to completion.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|value| value.to_str().unwrap())
    }
}

/// Sends `request` through a clone of `app`.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Sends a request with an optional JSON body.
pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

/// Encodes a client principal the way the hosting platform does.
pub fn encode_principal(json: &str) -> String {
    STANDARD.encode(json)
}

pub fn valid_principal() -> String {
    encode_principal(
        r#"{"identityProvider":"aad","userId":"d75b260a","userDetails":"ada@example.com","userRoles":["anonymous","authenticated"]}"#,
    )
}
