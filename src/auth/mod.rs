//! Bearer token authentication and resource authorization
//!
//! # Module Structure
//!
//! - [`auth::jwt`](crate::auth::jwt) - token issuing/verification and password hashing
//! - [`auth::middleware`](crate::auth::middleware) - identity resolution and Axum extractors
//! - [`auth::guard`](crate::auth::guard) - ownership and visibility predicates
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id with a random salt per hash
//! - **Tokens**: HS256 JWTs carrying `sub` (user id), `iat` and `exp`; both the
//!   signature and the expiry are checked on every request
//! - **Stateless**: there is no session table and no revocation list, a token
//!   stays valid until it expires
//!
//! # Extracting the Caller in Handlers
//!
//! ```ignore
//! // 401 when no valid identity is presented
//! async fn create(AuthUser(user): AuthUser) -> impl IntoResponse { ... }
//!
//! // anonymous callers get `None`
//! async fn read(MaybeUser(user): MaybeUser) -> impl IntoResponse { ... }
//! ```
//!
//! # Configuration
//!
//! Configure via `gravity.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "JWT_SECRET"   # env var holding the signing secret
//! jwt_access_expiry = 1800        # token validity in seconds
//! ```

/// Ownership and visibility checks.
pub mod guard;
/// Token issuing/verification and password hashing.
pub mod jwt;
/// Identity resolution and request extractors.
pub mod middleware;
