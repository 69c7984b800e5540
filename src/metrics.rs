use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Process-wide counters exposed on `/metrics`.
#[derive(Clone)]
pub struct Metrics {
    pub users_created: Arc<AtomicU64>,
    pub tokens_issued: Arc<AtomicU64>,
    pub login_failures: Arc<AtomicU64>,
    pub tags_created: Arc<AtomicU64>,
    pub ingredients_created: Arc<AtomicU64>,
    pub recipes_created: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            users_created: Arc::new(AtomicU64::new(0)),
            tokens_issued: Arc::new(AtomicU64::new(0)),
            login_failures: Arc::new(AtomicU64::new(0)),
            tags_created: Arc::new(AtomicU64::new(0)),
            ingredients_created: Arc::new(AtomicU64::new(0)),
            recipes_created: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_users_created(&self) {
        self.users_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tokens_issued(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_login_failures(&self) {
        self.login_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tags_created(&self) {
        self.tags_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ingredients_created(&self) {
        self.ingredients_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_recipes_created(&self) {
        self.recipes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            users_created: self.users_created.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            login_failures: self.login_failures.load(Ordering::Relaxed),
            tags_created: self.tags_created.load(Ordering::Relaxed),
            ingredients_created: self.ingredients_created.load(Ordering::Relaxed),
            recipes_created: self.recipes_created.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub users_created: u64,
    pub tokens_issued: u64,
    pub login_failures: u64,
    pub tags_created: u64,
    pub ingredients_created: u64,
    pub recipes_created: u64,
    pub uptime_seconds: u64,
}
