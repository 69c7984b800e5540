//! HTTP route handlers.
//!
//! - `admin`: staff-only user administration
//! - `catalog`: tags and ingredients
//! - `health`: liveness, readiness, metrics and version
//! - `recipes`: recipe CRUD
//! - `user`: registration, token issuance and self-management

pub mod admin;
pub mod catalog;
pub mod health;
pub mod recipes;
pub mod user;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{middleware, state::AppState};

/// Request bodies beyond this are rejected before reaching a handler.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the full application router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let cfg = state.config.clone();

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/user/create", post(user::create_user))
        .route("/user/token", post(user::create_token))
        .route("/user/me", get(user::get_me).patch(user::update_me))
        .route("/recipe/tags", get(catalog::list_tags).post(catalog::create_tag))
        .route("/recipe/tags/{id}", patch(catalog::update_tag).delete(catalog::delete_tag))
        .route("/recipe/ingredients", get(catalog::list_ingredients).post(catalog::create_ingredient))
        .route(
            "/recipe/ingredients/{id}",
            patch(catalog::update_ingredient).delete(catalog::delete_ingredient),
        )
        .route("/recipe/recipes", get(recipes::list_recipes).post(recipes::create_recipe))
        .route(
            "/recipe/recipes/{id}",
            get(recipes::get_recipe).patch(recipes::update_recipe).delete(recipes::delete_recipe),
        )
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/{id}",
            get(admin::get_user).patch(admin::update_user).delete(admin::delete_user),
        )
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit::rate_limit_middleware))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg, middleware::security_headers::security_headers_middleware))
}
