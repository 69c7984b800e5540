use std::sync::Arc;

use crate::accounts::UserManager;
use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::{EndpointRateLimiter, RateLimiter};

/// Endpoint keys for the per-route limiters.
pub const TOKEN_ENDPOINT: &str = "/user/token";
pub const CREATE_USER_ENDPOINT: &str = "/user/create";

/// The shared application state handed to every handler and stateful middleware.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// User factory and lookups, sharing `db`.
    pub users: UserManager,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
    /// Global per-IP limiter applied to every request.
    pub global_limiter: RateLimiter,
    /// Stricter limits for login and registration.
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        let rl = &config.rate_limit;
        let global_limiter = RateLimiter::new(rl.max_requests, rl.window_seconds);
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            (TOKEN_ENDPOINT, rl.token_max_requests, rl.token_window_seconds),
            (CREATE_USER_ENDPOINT, rl.create_user_max_requests, rl.create_user_window_seconds),
        ]);
        let users = UserManager::new(db.clone(), config.auth.argon2_params());

        Self { db, users, config: Arc::new(config), metrics: Metrics::new(), global_limiter, rate_limiter }
    }
}
