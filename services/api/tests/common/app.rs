//! Test harness around the real router, backed by the in-memory store and
//! the scripted generator.

use api_lib::adapters::{DocxRenderer, PptxRenderer};
use api_lib::config::Config;
use api_lib::credentials::TokenService;
use api_lib::web::{build_router, AppState};
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use super::{InMemoryDb, ScriptedGenerator};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const DEFAULT_REPLY: &str = "Opening paragraph.\n- first point\n- second point";
pub const PASSWORD: &str = "hunter22";

pub fn test_config(public_node_endpoints: bool) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("DATABASE_URL", "postgres://unused/docsmith".to_string()),
        ("SECRET_KEY", TEST_SECRET.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("PUBLIC_NODE_ENDPOINTS", public_node_endpoints.to_string()),
    ]);
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config is valid")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {:?}", e, self.body))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: header::HeaderName) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDb>,
    pub generator: Arc<ScriptedGenerator>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(false, ScriptedGenerator::replying(DEFAULT_REPLY))
    }

    pub fn with_generator(generator: ScriptedGenerator) -> Self {
        Self::build(false, generator)
    }

    /// Node detail, generate and refine served without authentication.
    pub fn public() -> Self {
        Self::build(true, ScriptedGenerator::replying(DEFAULT_REPLY))
    }

    fn build(public_node_endpoints: bool, generator: ScriptedGenerator) -> Self {
        let config = Arc::new(test_config(public_node_endpoints));
        let db = Arc::new(InMemoryDb::new());
        let generator = Arc::new(generator);
        let tokens = TokenService::from_config(&config);

        let state = Arc::new(AppState {
            db: db.clone(),
            config,
            tokens: tokens.clone(),
            generator: generator.clone(),
            docx_renderer: Arc::new(DocxRenderer::new()),
            pptx_renderer: Arc::new(PptxRenderer::new()),
        });

        Self {
            router: build_router(state),
            db,
            generator,
            tokens,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, token, None).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={}&password={}", email, password)))
            .unwrap();
        self.send(request).await
    }

    /// Registers `email` with [`PASSWORD`] and returns its access token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .post(
                "/auth/register",
                None,
                serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["access_token"]
            .as_str()
            .expect("access_token in register response")
            .to_string()
    }

    /// Creates a project with the given `(title, idx)` nodes and returns its JSON.
    pub async fn create_project(
        &self,
        token: &str,
        doc_type: &str,
        nodes: &[(&str, i32)],
    ) -> Value {
        let nodes: Vec<Value> = nodes
            .iter()
            .map(|(title, idx)| serde_json::json!({ "title": title, "idx": idx }))
            .collect();
        let response = self
            .post(
                "/projects",
                Some(token),
                serde_json::json!({
                    "title": "Ocean Report",
                    "doc_type": doc_type,
                    "main_prompt": "Ocean currents",
                    "nodes": nodes,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()
    }
}

/// `/projects/{id}/nodes/{node_id}` for the node at position `n` of a project JSON.
pub fn node_uri(project: &Value, n: usize) -> String {
    format!(
        "/projects/{}/nodes/{}",
        project["id"].as_str().unwrap(),
        project["nodes"][n]["id"].as_str().unwrap()
    )
}

pub fn project_uri(project: &Value) -> String {
    format!("/projects/{}", project["id"].as_str().unwrap())
}
