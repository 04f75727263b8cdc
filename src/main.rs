//! The binary entry point for the application.

use std::sync::Arc;
use std::time::Duration;

use app_core::config::Config;
use app_core::error::AppError;
use app_core::jwt::{JwtConfig, JwtService, TokenManager};
use app_core::middleware::request_response_logger;
use app_core::oauth::{OAuthClient, OAuthSettings};
use app_core::uid::{Generator, Snowflake};
use app_orm::schema;
use axum::http::StatusCode;
use axum::{Json, Router, middleware, routing};
use sea_orm::{ConnectOptions, Database};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "❌ Application failed to start");
        std::process::exit(1);
    }
}

/// Initializes all dependencies and starts the web server.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Reloaded from disk when the file changes.
    let config = Arc::new(
        Config::builder("config/config.yaml")
            .watch_interval(Duration::from_secs(5))
            .watch()
            .build()?,
    );

    let mut db_opt = ConnectOptions::new(config.get::<String>("database.url")?);
    db_opt
        .min_connections(config.get("database.min_connections")?)
        .max_connections(config.get("database.max_connections")?)
        .connect_timeout(Duration::from_secs(config.get("database.connect_timeout_secs")?))
        .acquire_timeout(Duration::from_secs(config.get("database.acquire_timeout_secs")?))
        .idle_timeout(Duration::from_secs(config.get("database.idle_timeout_secs")?))
        .max_lifetime(Duration::from_secs(config.get("database.max_lifetime_secs")?))
        .sqlx_logging(config.get("database.sqlx_logging")?)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db_pool = Arc::new(Database::connect(db_opt).await?);

    if config.get_or("database.create_schema", false)? {
        schema::create_tables(db_pool.as_ref()).await?;
        tracing::info!("Database schema ensured");
    }

    let snowflake: Arc<dyn Generator> = Arc::new(
        Snowflake::builder(config.get("snowflake.worker_id")?)
            .with_epoch(config.get("snowflake.epoch")?)
            .build()?,
    );

    let token_manager: Arc<dyn TokenManager> = Arc::new(JwtService::new(JwtConfig {
        secret: config.get("jwt.secret")?,
        exp_secs: config.get("jwt.expiration_secs")?,
        issuer: config.get("jwt.issuer")?,
        audience: config.get("jwt.audience")?,
    }));

    // Provider settings are read once; changing them requires a restart.
    let oauth_client = Arc::new(OAuthClient::from_settings(&config.get::<OAuthSettings>("oauth")?)?);
    tracing::info!(provider = oauth_client.provider(), "OAuth provider configured");

    // Cancelled on SIGINT/SIGTERM; in-flight logins hold child tokens.
    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    let auth_state = auth::new(auth::Dependency {
        db: db_pool,
        config: config.clone(),
        uid: snowflake,
        token: token_manager.clone(),
        oauth: oauth_client,
        shutdown: shutdown.clone(),
    });

    let timeout_secs = Duration::from_secs(config.get::<u64>("server.timeout_secs")?);
    let app = Router::new()
        .merge(auth::create_router(auth_state, token_manager))
        .route("/", routing::get(|| async { Json(serde_json::json!({"message": "Hello from OAuth Login"})) }))
        .fallback(|| async { AppError::NotFound("Endpoint not found".to_string()) })
        .method_not_allowed_fallback(|| async {
            (StatusCode::METHOD_NOT_ALLOWED, Json(serde_json::json!({"message": "Method not allowed"})))
        })
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_response_logger))
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout_secs)),
        );

    let server_address = config.get::<String>("server.address")?;
    let listener = tokio::net::TcpListener::bind(&server_address).await?;

    tracing::info!("🚀 listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("🛑 Server is shutting down gracefully...");
        })
        .await?;

    Ok(())
}

/// Spawns a background task that cancels `shutdown` on SIGINT or SIGTERM.
fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!(error = %err, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                },
                Err(err) => {
                    tracing::error!(error = %err, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                },
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("🔻 Received SIGINT (Ctrl+C)") },
            _ = terminate => { tracing::info!("🔻 Received SIGTERM") },
        }

        shutdown.cancel();
    });
}
