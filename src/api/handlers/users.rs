use crate::{
    auth::middleware::AuthUser,
    types::{AppError, Result, UserView},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// The authenticated user
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = UserView),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn me(AuthUser(user): AuthUser) -> Result<Json<UserView>> {
    Ok(Json(user.to_view()?))
}

/// Public profile of a user
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserView),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserView>> {
    let user = state
        .turso
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_view()?))
}
