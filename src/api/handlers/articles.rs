//! Article handlers.
//!
//! Anyone can list and read public articles; private ones are visible to
//! their author only. Only the author may update or delete.

use crate::{
    auth::{
        guard::{ensure_readable, ensure_writable},
        middleware::{AuthUser, MaybeUser},
    },
    db::turso::Article,
    types::{
        AppError, ArticleCreated, ArticleView, CreateArticleRequest, PageRequest, Result,
        UpdateArticleRequest,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

/// Query parameters for listing articles
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListArticlesQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Page size, 1 to 100
    pub size: Option<u32>,
    /// Case-insensitive search over title and content
    pub q: Option<String>,
}

/// List public articles, newest first
#[utoipa::path(
    get,
    path = "/api/articles",
    params(ListArticlesQuery),
    responses(
        (status = 200, description = "Public articles", body = Vec<ArticleView>),
        (status = 400, description = "Invalid paging parameters")
    ),
    tag = "articles"
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<ListArticlesQuery>,
) -> Result<Json<Vec<ArticleView>>> {
    let page = PageRequest::new(params.page, params.size)?;
    let search = params.q.as_deref().map(str::trim);

    let articles = state.turso.list_public_articles(page, search).await?;

    articles
        .into_iter()
        .map(Article::into_view)
        .collect::<Result<Vec<_>>>()
        .map(Json)
}

/// Create an article owned by the caller
#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = ArticleCreated),
        (status = 401, description = "Unauthorized")
    ),
    tag = "articles",
    security(("bearer" = []))
)]
pub async fn create_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleCreated>)> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }

    let article_id = state
        .turso
        .create_article(
            Some(user.id),
            &payload.title,
            &payload.content,
            payload.is_public,
        )
        .await?;

    info!(article_id, author_id = user.id, "Article created");

    Ok((StatusCode::CREATED, Json(ArticleCreated { article_id })))
}

/// Read an article
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(
        ("id" = i64, Path, description = "Article ID")
    ),
    responses(
        (status = 200, description = "Article", body = ArticleView),
        (status = 403, description = "Article is private"),
        (status = 404, description = "Article not found")
    ),
    tag = "articles"
)]
pub async fn get_article(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<ArticleView>> {
    let article = load(&state, id).await?;
    ensure_readable(&article, user.as_ref(), "article")?;

    Ok(Json(article.into_view()?))
}

/// Update an article
#[utoipa::path(
    patch,
    path = "/api/articles/{id}",
    params(
        ("id" = i64, Path, description = "Article ID")
    ),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated article", body = ArticleView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Article not found")
    ),
    tag = "articles",
    security(("bearer" = []))
)]
pub async fn update_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleView>> {
    let article = load(&state, id).await?;
    ensure_writable(&article, Some(&user), "article")?;

    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }

    let updated = state
        .turso
        .update_article(id, &payload.title, &payload.content, payload.is_public)
        .await?;

    info!(article_id = id, "Article updated");
    Ok(Json(updated.into_view()?))
}

/// Delete an article
#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(
        ("id" = i64, Path, description = "Article ID")
    ),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Article not found")
    ),
    tag = "articles",
    security(("bearer" = []))
)]
pub async fn delete_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let article = load(&state, id).await?;
    ensure_writable(&article, Some(&user), "article")?;

    if !state.turso.delete_article(id).await? {
        return Err(not_found());
    }

    info!(article_id = id, "Article deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load(state: &AppState, id: i64) -> Result<Article> {
    state.turso.get_article(id).await?.ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound("Article not found".to_string())
}
