//! Test helper module for admin-service integration tests.
//!
//! Builds the full router on top of the in-memory store and the mock cache,
//! so requests run in-process without PostgreSQL or Redis.

#![allow(dead_code)]

use admin_service::{
    build_router,
    config::{
        AdminConfig, CacheConfig, DatabaseConfig, Environment, JwtConfig, RateLimitConfig,
        RedisConfig, SecurityConfig, SwaggerConfig, SwaggerMode,
    },
    services::{InMemoryStore, MockCacheStore},
    AppState,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use service_core::axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const TEST_SECURITY_KEY: &str = "integration-test-signing-key";

pub fn test_config() -> AdminConfig {
    AdminConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "admin-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        cache: CacheConfig {
            lifetime_seconds: 60,
        },
        jwt: JwtConfig {
            issuer: "admin-service".to_string(),
            audience: "games".to_string(),
            expiry_in_minutes: 60,
            security_key: TEST_SECURITY_KEY.to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        rate_limit: RateLimitConfig {
            token_attempts: 3,
            token_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<MockCacheStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AdminConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(MockCacheStore::new());
        let state = AppState::new(
            config,
            store.clone(),
            cache.clone(),
            CancellationToken::new(),
        );
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            cache,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send(json_request(method, uri, body)).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Register a game with `(name, description)` rights and return the response body.
    pub async fn register(&self, game: &str, rights: &[(&str, &str)]) -> Value {
        let response = self.post("/rights/register", register_body(game, rights)).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body
    }

    /// Create a user through the API and return its id.
    pub async fn create_user(&self, nickname: &str, password: &str) -> String {
        let response = self
            .post(
                "/users",
                json!({
                    "nickname": nickname,
                    "email": format!("{}@example.com", nickname),
                    "encrypted_password_value": password,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["user_id"]
            .as_str()
            .expect("user_id missing")
            .to_string()
    }

    pub async fn grant(&self, user_id: &str, right_name: &str) {
        let response = self
            .post(
                &format!("/users/{}/rights", user_id),
                json!({ "right_name": right_name }),
            )
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT, "{}", response.body);
    }
}

pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

pub fn register_body(game: &str, rights: &[(&str, &str)]) -> Value {
    json!({
        "game": { "name": game, "description": format!("{} game", game) },
        "rights": rights
            .iter()
            .map(|(name, description)| json!({ "name": name, "description": description }))
            .collect::<Vec<_>>(),
    })
}

/// Names of the rights in a JSON array, sorted.
pub fn names(rights: &Value) -> Vec<String> {
    let mut names: Vec<String> = rights
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
