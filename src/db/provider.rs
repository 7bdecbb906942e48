//! Database backend selection
//!
//! # Example
//!
//! ```rust,ignore
//! use gravity::db::DatabaseProvider;
//!
//! // Ephemeral database (tests, demos)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // File-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data/gravity.db".into() }.create_client().await?;
//! ```

use super::turso::TursoClient;
use crate::types::{AppError, Result};
use crate::utils::toml_config::DatabaseConfig;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Create a database client from this provider configuration
    pub async fn create_client(&self) -> Result<TursoClient> {
        match self {
            DatabaseProvider::Memory => TursoClient::new_memory().await,
            DatabaseProvider::SQLite { path } => {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            AppError::Database(format!(
                                "Failed to create database directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }
                TursoClient::new_local(path).await
            }
            DatabaseProvider::Turso { url, auth_token } => {
                TursoClient::new_remote(url.clone(), auth_token.clone()).await
            }
        }
    }

    /// Short backend name for logs; never includes credentials.
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseProvider::Memory => "memory",
            DatabaseProvider::SQLite { .. } => "sqlite",
            DatabaseProvider::Turso { .. } => "turso",
        }
    }

    /// Pick the backend described by the `[database]` section.
    ///
    /// Remote Turso wins when both of its env vars are configured and set;
    /// otherwise `url` selects memory (`:memory:`) or a local file.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let remote = match (&config.turso_url_env, &config.turso_token_env) {
            (Some(url_env), Some(token_env)) => std::env::var(url_env)
                .ok()
                .zip(std::env::var(token_env).ok())
                .filter(|(url, token)| !url.is_empty() && !token.is_empty()),
            _ => None,
        };

        if let Some((url, auth_token)) = remote {
            return DatabaseProvider::Turso { url, auth_token };
        }

        if config.url == ":memory:" {
            DatabaseProvider::Memory
        } else {
            DatabaseProvider::SQLite {
                path: config.url.clone(),
            }
        }
    }
}
