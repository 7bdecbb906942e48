//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Gravity, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/auth`)
//! - `POST /api/auth/register` - Register and receive a bearer token
//! - `POST /api/auth/login` - Login and receive a bearer token
//!
//! ## Users (`/api/users`)
//! - `GET /api/users/me` - The authenticated user
//! - `GET /api/users/{id}` - Public profile of a user
//!
//! ## Articles (`/api/articles`)
//! - `GET /api/articles` - Public articles, newest first, with optional search
//! - `POST /api/articles` - Create an article
//! - `GET /api/articles/{id}` - Read an article (private ones only by the author)
//! - `PATCH /api/articles/{id}` - Update an article (author only)
//! - `DELETE /api/articles/{id}` - Delete an article (author only)
//!
//! ## Simulations (`/api/simulations`)
//! - `GET /api/simulations` - Public simulations, by recency or likes
//! - `POST /api/simulations` - Save a simulation
//! - `GET /api/simulations/{id}` - Read a simulation with its like count
//! - `PATCH /api/simulations/{id}` - Update a simulation (owner only)
//! - `DELETE /api/simulations/{id}` - Delete a simulation and its likes (owner only)
//! - `POST /api/simulations/{id}/like` - Like a simulation
//! - `DELETE /api/simulations/{id}/like` - Remove a like
//!
//! # Authentication
//!
//! Write endpoints require a valid JWT in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`. When the
//! `swagger-ui` feature is enabled, interactive documentation is available
//! at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    ArticleCreated, ArticleView, CreateArticleRequest, CreateSimulationRequest, LikeCount,
    LoginRequest, RegisterRequest, SimulationCreated, SimulationSort, SimulationView,
    TokenResponse, UpdateArticleRequest, UpdateSimulationRequest, UserView,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI description of every endpoint under `/api`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::users::me,
        handlers::users::get_user,
        handlers::articles::list_articles,
        handlers::articles::create_article,
        handlers::articles::get_article,
        handlers::articles::update_article,
        handlers::articles::delete_article,
        handlers::simulations::list_simulations,
        handlers::simulations::create_simulation,
        handlers::simulations::get_simulation,
        handlers::simulations::update_simulation,
        handlers::simulations::delete_simulation,
        handlers::simulations::like_simulation,
        handlers::simulations::unlike_simulation,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        UserView,
        CreateArticleRequest,
        UpdateArticleRequest,
        ArticleCreated,
        ArticleView,
        CreateSimulationRequest,
        UpdateSimulationRequest,
        SimulationCreated,
        SimulationView,
        SimulationSort,
        LikeCount,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "User profiles"),
        (name = "articles", description = "Articles"),
        (name = "simulations", description = "Simulations and likes"),
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
