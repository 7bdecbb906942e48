//! Init command implementation
//!
//! Scaffolds a Gravity deployment directory: `gravity.toml`, `.env.example`,
//! `.gitignore` and the `data/` directory for the SQLite file.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// gravity.toml already exists and `--force` was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Gravity");

    let base_path = &config.path;

    let config_path = base_path.join("gravity.toml");
    if config_path.exists() && !config.force {
        output.warning("gravity.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating directories");

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.skipped("data", "already exists");
    } else if let Err(e) = fs::create_dir_all(&data_dir) {
        output.error(&format!("Failed to create data: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.created_dir("data");
    }

    output.subheader("Creating configuration files");

    let files = [
        ("config", "gravity.toml", generate_gravity_toml(&config)),
        ("env", ".env.example", generate_env_example()),
    ];

    for (kind, name, content) in files {
        match write_file(&base_path.join(name), &content, config.force) {
            Ok(true) => output.created(kind, name),
            Ok(false) => output.skipped(name, "already exists"),
            Err(e) => {
                output.error(&format!("Failed to create {}: {}", name, e));
                return InitResult::Error(e.to_string());
            }
        }
    }

    // Never overwrite an existing .gitignore, even with --force.
    match write_file(&base_path.join(".gitignore"), generate_gitignore(), false) {
        Ok(true) => output.created("file", ".gitignore"),
        Ok(false) => output.skipped(".gitignore", "already exists"),
        Err(e) => output.warning(&format!("Failed to create .gitignore: {}", e)),
    }

    output.complete("Gravity initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set the signing secret:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set JWT_SECRET (32+ random characters)");
    output.newline();
    output.info("2. Start the server:");
    output.command("gravity-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));
    output.hint("API docs available at /swagger-ui/ (requires 'swagger-ui' feature)");

    InitResult::Success
}

/// Writes `content` unless the file exists and `force` is false.
///
/// Returns whether the file was written.
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_gravity_toml(config: &InitConfig) -> String {
    format!(
        r#"# Gravity configuration
# Secrets are never stored here; each *_env key names an environment variable.

[server]
host = "{host}"
port = {port}
log_level = "info"

[auth]
jwt_secret_env = "JWT_SECRET"
# Token lifetime in seconds
jwt_access_expiry = 1800
min_password_length = 6

[database]
# Local SQLite file, or ":memory:" for an ephemeral database
url = "./data/gravity.db"

# Remote Turso (both must be set to take effect)
# turso_url_env = "TURSO_DATABASE_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"
"#,
        host = config.host,
        port = config.port
    )
}

fn generate_env_example() -> String {
    r#"# Signing secret for access tokens (required, 32+ characters recommended)
JWT_SECRET=change-me-to-a-long-random-string

# Log filter, overrides server.log_level
# RUST_LOG=gravity=debug,tower_http=debug

# Remote Turso database (optional)
# TURSO_DATABASE_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=
"#
    .to_string()
}

fn generate_gitignore() -> &'static str {
    r#"# Environment
.env

# Database
data/*.db
data/*.db-*

# Build
/target
"#
}
