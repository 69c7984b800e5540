//! # Recipe API
//!
//! Backend for a recipe-management service. Users register with an email address, exchange
//! credentials for an opaque token, and manage their own tags, ingredients and recipes.
//! Every owned entity is visible only to the user who created it.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP routing, extractors and middleware
//! - **SQLx**: SQLite persistence
//! - **Argon2**: password hashing
//! - **Tokio**: async runtime
//!
//! ## Core Components
//!
//! - [`accounts`]: user model, the user manager, password hashing and auth tokens
//! - [`catalog`]: tags and ingredients
//! - [`recipes`]: recipes and their tag/ingredient links
//! - [`config`]: layered TOML/env configuration
//! - [`db`]: schema initialization
//! - [`error`]: the `AppError` type and its HTTP mapping
//! - [`metrics`]: process counters
//! - [`middleware`]: token auth extractors, rate limiting, security headers
//! - [`routes`]: HTTP handlers and the router
//! - [`state`]: shared application state
//! - [`types`]: request and response DTOs
//! - [`validation`]: field validators

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod recipes;
pub mod routes;
pub mod state;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;
