use crate::{
    types::{AppError, LoginRequest, RegisterRequest, Result, TokenResponse},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use tracing::info;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = TokenResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let username = payload.username.trim();
    let email = payload.email.trim();
    let min_len = state.config.auth.min_password_length;

    if username.is_empty() {
        return Err(AppError::InvalidInput("Username is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        ));
    }
    if payload.password.chars().count() < min_len {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            min_len
        )));
    }

    // A concurrent registration can still slip past this; the UNIQUE
    // constraint turns that case into the same Conflict.
    if state.turso.get_user_by_email(email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Email {} is already registered",
            email
        )));
    }

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    let created_at = payload.created_at.unwrap_or_else(Utc::now);

    let user = state
        .turso
        .create_user(username, email, Some(&password_hash), created_at)
        .await?;

    let token = state.auth_service.issue_token(&user.id.to_string())?;
    info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .turso
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;

    if !state
        .auth_service
        .verify_password(&payload.password, hash)?
    {
        return Err(invalid());
    }

    let token = state.auth_service.issue_token(&user.id.to_string())?;
    info!(user_id = user.id, "User logged in");

    Ok(Json(TokenResponse::bearer(token)))
}
