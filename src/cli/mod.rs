//! CLI module for Gravity
//!
//! Provides command-line interface parsing and handling for the gravity-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use crate::utils::toml_config::{ConfigError, GravityConfig};
use clap::{Parser, Subcommand};
use output::Output;
use std::path::{Path, PathBuf};

/// Gravity - backend for a physics-simulation sharing site
#[derive(Parser, Debug)]
#[command(
    name = "gravity-server",
    version,
    about = "Gravity - backend for a physics-simulation sharing site",
    long_about = "Serves accounts, articles, simulations and likes over a JSON API.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a deployment.",
    after_help = "EXAMPLES:\n    \
                  gravity-server init                  # Scaffold gravity.toml and .env.example\n    \
                  gravity-server                       # Start the server (requires gravity.toml)\n    \
                  gravity-server config --validate     # Check the configuration\n    \
                  gravity-server --config prod.toml    # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "gravity.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new Gravity deployment directory
    ///
    /// Creates gravity.toml, .env.example, .gitignore and data/.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Fail unless the configuration passes validation
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Print the configuration with the signing secret redacted.
///
/// With `validate`, the configuration must also pass validation; the
/// returned error is what the binary reports.
pub fn show_config(path: &Path, validate: bool, output: &Output) -> Result<(), ConfigError> {
    output.header("Gravity Configuration");
    output.kv("file", &path.display().to_string());

    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ReadError(e),
    })?;
    let config: GravityConfig = toml::from_str(&content)?;

    output.subheader("Server");
    output.kv("host", &config.server.host);
    output.kv("port", &config.server.port.to_string());
    output.kv("log_level", &config.server.log_level);

    output.subheader("Auth");
    let secret_state = match config.jwt_secret() {
        Ok(secret) if !secret.is_empty() => "set (redacted)",
        Ok(_) => "empty",
        Err(_) => "not set",
    };
    output.kv(
        "jwt_secret_env",
        &format!("{} [{}]", config.auth.jwt_secret_env, secret_state),
    );
    output.kv(
        "jwt_access_expiry",
        &format!("{}s", config.auth.jwt_access_expiry),
    );
    output.kv(
        "min_password_length",
        &config.auth.min_password_length.to_string(),
    );

    output.subheader("Database");
    output.kv("url", &config.database.url);
    if let (Some(url_env), Some(token_env)) = (
        &config.database.turso_url_env,
        &config.database.turso_token_env,
    ) {
        output.kv("turso_url_env", url_env);
        output.kv("turso_token_env", &format!("{} [redacted]", token_env));
    }

    if validate {
        config.validate()?;
        for warning in config.warnings() {
            output.warning(&warning.message);
        }
        output.success("Configuration is valid");
    }

    Ok(())
}
