#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use diagnose_service::config::DiagnoseConfig;
use diagnose_service::services::providers::mock::MockTextProvider;
use diagnose_service::startup::{build_router, AppState, Application};
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";

/// Config as if loaded from the environment, with a test key and port 0.
pub fn test_config(vars: &[(&str, &str)]) -> DiagnoseConfig {
    let mut map: HashMap<String, String> = HashMap::new();
    map.insert("GEMINI_API_KEY".to_string(), TEST_API_KEY.to_string());
    for (key, value) in vars {
        map.insert(key.to_string(), value.to_string());
    }

    DiagnoseConfig::from_lookup(CoreConfig { port: 0 }, |key| map.get(key).cloned())
        .expect("Failed to build test config")
}

pub fn router_with(provider: Arc<MockTextProvider>, config: &DiagnoseConfig) -> Router {
    let state = AppState::new(config, provider);
    build_router(state, config.max_body_bytes)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// POST a raw body to the diagnosis route.
pub async fn post_diagnose(router: Router, body: impl Into<Body>) -> TestResponse {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ki-diagnose")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the full application on a random port.
    pub async fn spawn(provider: Arc<MockTextProvider>, config: DiagnoseConfig) -> Self {
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the liveness endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
