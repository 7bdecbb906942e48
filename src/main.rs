use anyhow::Context;
use gravity::{
    auth::jwt::AuthService,
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        show_config, Cli, Commands,
    },
    db::DatabaseProvider,
    utils::toml_config::{ConfigError, GravityConfig},
    AppState,
};
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let config = InitConfig {
                path,
                force,
                host,
                port,
            };
            match init::run(config, &output) {
                InitResult::Success | InitResult::AlreadyExists => ExitCode::SUCCESS,
                InitResult::Error(_) => ExitCode::FAILURE,
            }
        }
        Some(Commands::Config { validate }) => match show_config(&cli.config, validate, &output) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                output.error(&e.to_string());
                ExitCode::FAILURE
            }
        },
        None => {
            let config = match GravityConfig::load(&cli.config) {
                Ok(config) => config,
                Err(e) => {
                    output.error(&e.to_string());
                    if matches!(e, ConfigError::FileNotFound(_)) {
                        output.hint("Run 'gravity-server init' to create a configuration");
                    }
                    return ExitCode::FAILURE;
                }
            };

            init_tracing(&config, cli.verbose);

            match serve(config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("Server failed: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// `RUST_LOG` wins over `server.log_level`; `--verbose` forces debug.
fn init_tracing(config: &GravityConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},tower_http={}", default_level, default_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: GravityConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Gravity v{}", env!("CARGO_PKG_VERSION"));

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    let provider = DatabaseProvider::from_config(&config.database);
    let turso = provider
        .create_client()
        .await
        .context("Failed to open database")?;
    tracing::info!(backend = provider.kind(), "Database ready");

    let secret = config.jwt_secret()?;
    let auth_service = AuthService::new(&secret, config.auth.jwt_access_expiry);

    let addr = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        turso: Arc::new(turso),
        auth_service: Arc::new(auth_service),
    };

    let app = gravity::build_router(state)
        .route(
            "/api-docs/openapi.json",
            axum::routing::get(|| async { axum::Json(gravity::api::ApiDoc::openapi()) }),
        );

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/swagger.json", gravity::api::ApiDoc::openapi()),
    );

    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
