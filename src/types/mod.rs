use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Authentication Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Optional client-supplied signup time; defaults to now
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// JWT claims. `sub` carries the user id as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

// ============= User Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ============= Article Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub is_public: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateArticleRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArticleCreated {
    #[serde(rename = "articleId")]
    pub article_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArticleView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============= Simulation Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSimulationRequest {
    pub title: String,
    pub data: i64,
    pub data2: i64,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSimulationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub data: Option<i64>,
    #[serde(default)]
    pub data2: Option<i64>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimulationCreated {
    #[serde(rename = "simulationId")]
    pub simulation_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SimulationView {
    pub id: i64,
    pub title: String,
    pub data: i64,
    pub data2: i64,
    pub is_public: bool,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    /// Whether the signed-in reader likes this simulation; absent for anonymous reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked_by_me: Option<bool>,
}

/// Result of a like toggle: the simulation and its freshly counted likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LikeCount {
    #[serde(rename = "simulationId")]
    pub simulation_id: i64,
    pub likes: i64,
}

// ============= Listing =============

/// Page window shared by the list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const MAX_SIZE: u32 = 100;

    pub fn new(page: Option<u32>, size: Option<u32>) -> Result<Self> {
        let page = page.unwrap_or(1);
        let size = size.unwrap_or(10);

        if page < 1 {
            return Err(AppError::InvalidInput("page must be at least 1".to_string()));
        }
        if !(1..=Self::MAX_SIZE).contains(&size) {
            return Err(AppError::InvalidInput(format!(
                "size must be between 1 and {}",
                Self::MAX_SIZE
            )));
        }

        Ok(Self { page, size })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SimulationSort {
    #[default]
    Latest,
    Likes,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let (status, message) = match self {
            AppError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = axum::Json(serde_json::json!({
            "error": message
        }));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
