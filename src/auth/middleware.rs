use crate::auth::jwt::AuthService;
use crate::db::turso::User;
use crate::types::{AppError, Result};
use crate::AppState;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use tracing::{debug, warn};

/// Read access to user identities, used to resolve token subjects.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Any other scheme, or an empty token, counts as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolves a token to an existing user or fails with `Unauthorized`.
///
/// The subject is looked up on every call so tokens of deleted users stop
/// working immediately, even though the token itself is still valid.
pub async fn resolve_required<C>(
    auth: &AuthService,
    store: &C,
    token: Option<&str>,
) -> Result<User>
where
    C: CredentialStore + ?Sized,
{
    let token = token.ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
    let claims = auth
        .verify_token(token)
        .inspect_err(|e| warn!("Rejected bearer token: {}", e))?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
}

/// Like [`resolve_required`], but authentication failures resolve to anonymous.
///
/// Storage errors still propagate.
pub async fn resolve_optional<C>(
    auth: &AuthService,
    store: &C,
    token: Option<&str>,
) -> Result<Option<User>>
where
    C: CredentialStore + ?Sized,
{
    match resolve_required(auth, store, token).await {
        Ok(user) => Ok(Some(user)),
        Err(AppError::Unauthorized(reason)) => {
            if token.is_some() {
                debug!("Treating caller as anonymous: {}", reason);
            }
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Extractor for endpoints that require an authenticated user.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(&parts.headers);

        resolve_required(&state.auth_service, state.turso.as_ref(), token)
            .await
            .map(AuthUser)
    }
}

/// Extractor for endpoints that serve both owners and anonymous callers.
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(&parts.headers);

        resolve_optional(&state.auth_service, state.turso.as_ref(), token)
            .await
            .map(MaybeUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    struct MapStore(HashMap<i64, User>);

    #[async_trait]
    impl CredentialStore for MapStore {
        async fn find_user(&self, id: i64) -> Result<Option<User>> {
            Ok(self.0.get(&id).cloned())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn find_user(&self, _id: i64) -> Result<Option<User>> {
            Err(AppError::Database("connection refused".to_string()))
        }
    }

    fn store_with(ids: &[i64]) -> MapStore {
        MapStore(
            ids.iter()
                .map(|&id| {
                    (
                        id,
                        User {
                            id,
                            username: format!("user{}", id),
                            email: format!("user{}@example.com", id),
                            password_hash: None,
                            created_at: 0,
                        },
                    )
                })
                .collect(),
        )
    }

    fn service() -> AuthService {
        AuthService::new("middleware-test-secret-32-chars-min", 600)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("valid header"),
        );
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_required_resolves_existing_user() {
        let auth = service();
        let store = store_with(&[1]);
        let token = auth.issue_token("1").expect("should issue");

        let user = resolve_required(&auth, &store, Some(&token))
            .await
            .expect("should resolve");
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_required_rejects_missing_and_invalid_tokens() {
        let auth = service();
        let store = store_with(&[1]);
        let expired = auth
            .issue_token_at("1", Utc::now() - Duration::seconds(601))
            .expect("should issue");
        let foreign = AuthService::new("another-secret-that-is-32-chars!!", 600)
            .issue_token("1")
            .expect("should issue");
        let bad_subject = auth.issue_token("not-a-number").expect("should issue");

        let tokens = [
            None,
            Some("garbage"),
            Some(expired.as_str()),
            Some(foreign.as_str()),
            Some(bad_subject.as_str()),
        ];

        for token in tokens {
            let result = resolve_required(&auth, &store, token).await;
            assert!(
                matches!(result, Err(AppError::Unauthorized(_))),
                "{:?} should be unauthorized",
                token
            );
        }
    }

    #[tokio::test]
    async fn test_required_rejects_deleted_user() {
        let auth = service();
        let store = store_with(&[]);
        let token = auth.issue_token("99").expect("should issue");

        let result = resolve_required(&auth, &store, Some(&token)).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_optional_downgrades_to_anonymous() {
        let auth = service();
        let store = store_with(&[1]);
        let orphan = auth.issue_token("2").expect("should issue");

        assert!(resolve_optional(&auth, &store, None)
            .await
            .expect("should resolve")
            .is_none());
        assert!(resolve_optional(&auth, &store, Some("garbage"))
            .await
            .expect("should resolve")
            .is_none());
        assert!(resolve_optional(&auth, &store, Some(&orphan))
            .await
            .expect("should resolve")
            .is_none());

        let token = auth.issue_token("1").expect("should issue");
        let user = resolve_optional(&auth, &store, Some(&token))
            .await
            .expect("should resolve");
        assert_eq!(user.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn test_optional_propagates_storage_errors() {
        let auth = service();
        let token = auth.issue_token("1").expect("should issue");

        let result = resolve_optional(&auth, &BrokenStore, Some(&token)).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
