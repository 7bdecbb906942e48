//! # Gravity - backend for a physics-simulation sharing site
//!
//! Gravity serves a small JSON API over HTTP: users register and log in with
//! a password, publish articles, save simulations, and like other people's
//! simulations.
//!
//! ## Overview
//!
//! Gravity can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `gravity-server` binary
//! 2. **As a library** - Build the router into your own Axum application
//!
//! ### Embedding the Router
//!
//! ```rust,ignore
//! use gravity::{auth::jwt::AuthService, db::DatabaseProvider, AppState, GravityConfig};
//! use std::sync::Arc;
//!
//! let config = GravityConfig::load("gravity.toml")?;
//! let turso = DatabaseProvider::from_config(&config.database).create_client().await?;
//! let auth = AuthService::new(&config.jwt_secret()?, config.auth.jwt_access_expiry);
//!
//! let state = AppState {
//!     config: Arc::new(config),
//!     turso: Arc::new(turso),
//!     auth_service: Arc::new(auth),
//! };
//! let app = gravity::build_router(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `swagger-ui` | Interactive API documentation at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - password hashing, bearer tokens, ownership checks
//! - [`cli`] - command-line parsing and project scaffolding
//! - [`db`] - libsql storage (memory, local file, remote Turso)
//! - [`types`] - request/response types and error handling
//! - [`utils`] - configuration loading

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication and authorization.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Database client and like ledger.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{DatabaseProvider, LikeLedger, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::GravityConfig;

use crate::auth::jwt::AuthService;
use axum::{routing::get, Json, Router};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<GravityConfig>,
    /// Database client
    pub turso: Arc<TursoClient>,
    /// Password hashing and token service
    pub auth_service: Arc<AuthService>,
}

/// The complete application router: the liveness routes plus the API under `/api`.
///
/// HTTP layers (tracing, CORS, Swagger UI) are added by the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api::routes::create_router())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Gravity backend running" }))
}
