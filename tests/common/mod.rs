#![allow(dead_code)]

//! In-process HTTP test client. Requests are dispatched with
//! `tower::ServiceExt::oneshot`, no TCP port involved.

use axum::body::Body;
use axum::Router;
use http::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

use tinta::config::AppConfig;
use tinta::routes::build_router;
use tinta::state::AppState;

pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
}

fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test-secret".into(),
        token_ttl_hours: 1,
        static_dir: "static".into(),
        chat_api_key: None,
        chat_api_base: "http://localhost:9".into(),
        chat_model: "test-model".into(),
        chat_system_instruction: "You are a test assistant.".into(),
        chat_initial_greeting: "Hello from the test assistant.".into(),
    }
}

impl TestApp {
    /// Spin up the full application against a fresh in-memory database.
    pub async fn spawn() -> Self {
        // A single connection keeps every query on the same in-memory DB.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory database");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("failed to run migrations");
        let router = build_router(AppState::new(pool.clone(), test_config()));
        Self { router, pool }
    }

    /// Register a user and log them in, returning `(token, user_id)`.
    pub async fn register_and_login(&self, username: &str, email: &str) -> (String, i64) {
        let response = self
            .post("/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": "password123",
            }))
            .send()
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "register failed");

        let response = self
            .post("/login")
            .json(&json!({ "email": email, "password": "password123" }))
            .send()
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed");
        let body = response.json();
        (
            body["token"].as_str().expect("missing token").to_owned(),
            body["user_id"].as_i64().expect("missing user_id"),
        )
    }

    pub fn get(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::GET, path)
    }

    pub fn post(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::POST, path)
    }

    pub fn put(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::DELETE, path)
    }
}

pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: Method, path: &str) -> Self {
        Self {
            app,
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a Bearer token authorization header.
    pub fn bearer(mut self, token: &str) -> Self {
        self.headers
            .insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: http::header::HeaderName, value: impl AsRef<str>) -> Self {
        self.headers.insert(name, value.as_ref().parse().unwrap());
        self
    }

    /// Set a raw request body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the request body as JSON. Also sets Content-Type to `application/json`.
    pub fn json(mut self, body: &impl Serialize) -> Self {
        self.body = Some(serde_json::to_vec(body).unwrap());
        self.headers
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        self
    }

    /// Send the request and return the response.
    pub async fn send(self) -> TestResponse {
        let body = match self.body {
            Some(b) => Body::from(b),
            None => Body::empty(),
        };

        let mut builder = Request::builder().method(self.method).uri(&self.path);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        let request = builder.body(body).unwrap();

        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes()
            .to_vec();
        TestResponse { status, body }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse the response body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response body is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}
