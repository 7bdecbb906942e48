//! TOML-based configuration for Gravity
//!
//! Server, authentication and database settings are read once at startup
//! from `gravity.toml`. Secrets are not stored in the file itself: the file
//! names the environment variables that hold them.
//!
//! The configuration is not hot-reloaded. The signing secret in particular
//! must stay fixed for the life of the process.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from gravity.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GravityConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// [server]

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// [auth]

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Name of the env var the signing secret is read from
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Token validity in seconds
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_expiry: i64,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_jwt_access_expiry() -> i64 {
    1800
}

fn default_min_password_length() -> usize {
    6
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            jwt_access_expiry: default_jwt_access_expiry(),
            min_password_length: default_min_password_length(),
        }
    }
}

// [database]

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Env var holding a remote libsql URL; with the token var set, it wins over `url`
    pub turso_url_env: Option<String>,

    /// Env var holding the remote auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/gravity.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

// Loading

/// Longest accepted token lifetime: one year.
pub const MAX_ACCESS_EXPIRY_SECS: i64 = 365 * 24 * 60 * 60;

/// Secrets shorter than this are accepted but reported.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

/// Something worth fixing that does not stop the server from starting
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    WeakSecret,
    EphemeralDatabase,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Why `gravity.toml` could not be turned into a `GravityConfig`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl GravityConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GravityConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.jwt_secret()?;
        if secret.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "JWT secret in '{}' is empty",
                self.auth.jwt_secret_env
            )));
        }

        if self.auth.jwt_access_expiry <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt_access_expiry must be a positive number of seconds".to_string(),
            ));
        }

        if self.auth.jwt_access_expiry > MAX_ACCESS_EXPIRY_SECS {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt_access_expiry must be at most {} seconds",
                MAX_ACCESS_EXPIRY_SECS
            )));
        }

        if self.auth.min_password_length == 0 {
            return Err(ConfigError::ValidationError(
                "auth.min_password_length must be at least 1".to_string(),
            ));
        }

        match (&self.database.turso_url_env, &self.database.turso_token_env) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::ValidationError(
                    "database.turso_url_env and database.turso_token_env must be set together"
                        .to_string(),
                ));
            }
            _ => {}
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Non-fatal issues worth logging at startup.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Ok(secret) = self.jwt_secret() {
            if secret.len() < RECOMMENDED_SECRET_LEN {
                warnings.push(ConfigWarning {
                    kind: ConfigWarningKind::WeakSecret,
                    message: format!(
                        "JWT secret in '{}' is shorter than {} bytes",
                        self.auth.jwt_secret_env, RECOMMENDED_SECRET_LEN
                    ),
                });
            }
        }

        if self.database.url == ":memory:" && self.database.turso_url_env.is_none() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::EphemeralDatabase,
                message: "Using an in-memory database; all data is lost on restart".to_string(),
            });
        }

        warnings
    }

    /// Read the env var named by a `*_env` field
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Resolve the token signing secret
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own env var name so tests can run in parallel.

    fn config_with_secret_env(env: &str) -> String {
        format!(
            r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"

[auth]
jwt_secret_env = "{}"
jwt_access_expiry = 600

[database]
url = "./data/test.db"
"#,
            env
        )
    }

    #[test]
    fn test_parse_config() {
        std::env::set_var(
            "GRAVITY_TEST_SECRET_PARSE",
            "test-secret-at-least-32-characters-long",
        );

        let config = GravityConfig::from_toml_str(&config_with_secret_env(
            "GRAVITY_TEST_SECRET_PARSE",
        ))
        .expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.auth.jwt_access_expiry, 600);
        assert_eq!(config.auth.min_password_length, 6);
        assert_eq!(config.database.url, "./data/test.db");
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_defaults_apply_to_empty_sections() {
        std::env::set_var("JWT_SECRET", "default-env-secret-that-is-32-chars-long");

        let config = GravityConfig::from_toml_str("").expect("empty config uses defaults");

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.jwt_secret_env, "JWT_SECRET");
        assert_eq!(config.auth.jwt_access_expiry, 1800);
        assert_eq!(config.database.url, "./data/gravity.db");
    }

    #[test]
    fn test_missing_secret_env_fails() {
        let result = GravityConfig::from_toml_str(&config_with_secret_env(
            "GRAVITY_TEST_SECRET_DEFINITELY_UNSET",
        ));

        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "GRAVITY_TEST_SECRET_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_non_positive_expiry_fails() {
        std::env::set_var("GRAVITY_TEST_SECRET_EXPIRY", "secret-for-expiry-test-32-chars-long");

        let content = r#"
[auth]
jwt_secret_env = "GRAVITY_TEST_SECRET_EXPIRY"
jwt_access_expiry = 0
"#;

        assert!(matches!(
            GravityConfig::from_toml_str(content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_oversized_expiry_fails() {
        std::env::set_var("GRAVITY_TEST_SECRET_BIG_EXPIRY", "secret-for-expiry-test-32-chars-long");

        let content = r#"
[auth]
jwt_secret_env = "GRAVITY_TEST_SECRET_BIG_EXPIRY"
jwt_access_expiry = 10000000000000000
"#;

        assert!(matches!(
            GravityConfig::from_toml_str(content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_one_year_expiry_is_accepted() {
        std::env::set_var("GRAVITY_TEST_SECRET_YEAR_EXPIRY", "secret-for-expiry-test-32-chars-long");

        let content = format!(
            "[auth]\njwt_secret_env = \"GRAVITY_TEST_SECRET_YEAR_EXPIRY\"\njwt_access_expiry = {}\n",
            MAX_ACCESS_EXPIRY_SECS
        );

        let config = GravityConfig::from_toml_str(&content).expect("one year is allowed");
        assert_eq!(config.auth.jwt_access_expiry, MAX_ACCESS_EXPIRY_SECS);
    }

    #[test]
    fn test_half_configured_turso_fails() {
        std::env::set_var("GRAVITY_TEST_SECRET_TURSO", "secret-for-turso-test-32-chars-long!");

        let content = r#"
[auth]
jwt_secret_env = "GRAVITY_TEST_SECRET_TURSO"

[database]
turso_url_env = "TURSO_URL"
"#;

        assert!(matches!(
            GravityConfig::from_toml_str(content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_weak_secret_and_memory_db_warn() {
        std::env::set_var("GRAVITY_TEST_SECRET_WEAK", "short");

        let content = r#"
[auth]
jwt_secret_env = "GRAVITY_TEST_SECRET_WEAK"

[database]
url = ":memory:"
"#;

        let config = GravityConfig::from_toml_str(content).expect("weak secret is allowed");
        let kinds: Vec<ConfigWarningKind> =
            config.warnings().into_iter().map(|w| w.kind).collect();

        assert!(kinds.contains(&ConfigWarningKind::WeakSecret));
        assert!(kinds.contains(&ConfigWarningKind::EphemeralDatabase));
    }

    #[test]
    fn test_load_missing_file() {
        let result = GravityConfig::load("/nonexistent/gravity.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        std::env::set_var("GRAVITY_TEST_SECRET_FILE", "secret-for-file-test-32-chars-long!!");

        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("gravity.toml");
        fs::write(&path, config_with_secret_env("GRAVITY_TEST_SECRET_FILE"))
            .expect("write config");

        let config = GravityConfig::load(&path).expect("load config");
        assert_eq!(config.server.port, 9000);
    }
}
