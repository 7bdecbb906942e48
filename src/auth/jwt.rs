use crate::types::{AppError, Claims, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Authentication service for bearer token management and password hashing.
///
/// Tokens are HS256 JWTs carrying the user id as `sub` plus `iat`/`exp`.
/// Passwords are hashed with Argon2id into PHC strings.
///
/// The signing secret is fixed for the lifetime of the service. Rotating it
/// (building a new service with another secret) invalidates every token
/// issued by the old one.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry: i64,
}

impl AuthService {
    /// Creates a new AuthService.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for signing tokens (should be at least 32 chars)
    /// * `access_expiry` - Token validity in seconds
    pub fn new(jwt_secret: &str, access_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            access_expiry,
        }
    }

    /// Token validity in seconds.
    pub fn access_expiry(&self) -> i64 {
        self.access_expiry
    }

    /// Hashes a password using Argon2id with a fresh random salt.
    ///
    /// Returns a PHC-formatted hash string.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verifies a password against an Argon2 hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Issues a token for `subject` valid for `access_expiry` seconds from now.
    pub fn issue_token(&self, subject: &str) -> Result<String> {
        self.issue_token_at(subject, Utc::now())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_token_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = Duration::try_seconds(self.access_expiry)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Token lifetime of {} seconds is out of range",
                    self.access_expiry
                ))
            })?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token against the current time and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.verify_token_at(token, Utc::now())
    }

    /// Verifies signature and expiry of a token as seen at `now`.
    ///
    /// A token is valid while `exp > now`; there is no leeway.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        // Expiry is checked below against the caller's clock instead of
        // the library's, so the library check is disabled but `exp` stays required.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if claims.exp <= now.timestamp() {
            return Err(AppError::Unauthorized("Token has expired".to_string()));
        }

        Ok(claims)
    }
}
