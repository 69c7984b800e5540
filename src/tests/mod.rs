//! Integration-style tests that drive the real router over an in-memory SQLite database.
//!
//! - **accounts_tests**: user manager (normalization, superusers, authentication)
//! - **user_api_tests**: registration, token issuance, `/user/me`
//! - **tags_api_tests** / **ingredients_api_tests**: per-user catalog endpoints
//! - **recipes_api_tests**: recipe CRUD and ownership
//! - **admin_api_tests**: staff-only user administration
//! - **health_api_tests**: liveness, readiness, metrics, version, headers
//! - **config_tests**, **db_tests**, **error_tests**

pub mod config_tests;
pub mod recipes_api_tests;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use crate::accounts::{token, NewUserFields, User};
use crate::config::AppConfig;
use crate::state::AppState;

/// Defaults with cheap hashing and limits high enough to never trigger.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.argon2_memory_kib = 1024;
    config.auth.argon2_iterations = 1;
    config.auth.argon2_parallelism = 1;
    config.rate_limit.max_requests = 10_000;
    config.rate_limit.token_max_requests = 10_000;
    config.rate_limit.create_user_max_requests = 10_000;
    config
}

pub async fn test_state_with(config: AppConfig) -> AppState {
    // One connection that never idles out keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::init_db(&pool).await.unwrap();
    AppState::new(pool, config)
}

pub async fn setup() -> (Router, AppState) {
    let state = test_state_with(test_config()).await;
    (crate::routes::router(state.clone()), state)
}

pub async fn create_user(state: &AppState, email: &str, password: &str) -> User {
    state.users.create_user(email, Some(password), NewUserFields::default()).await.unwrap()
}

pub async fn token_for(state: &AppState, user: &User) -> String {
    token::get_or_create(&state.db, user.id).await.unwrap()
}

/// Sends a request and returns status plus parsed JSON body (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, json)
}

/// The `details.fields` map of a validation error body.
pub fn field_errors(body: &Value) -> &Value {
    &body["error"]["details"]["fields"]
}
