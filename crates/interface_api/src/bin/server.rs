//! Estate Levy - API Server Binary
//!
//! Starts the HTTP API for recording levy payments.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store, default configuration
//! cargo run --bin levy-api
//!
//! # PostgreSQL
//! LEVY_DATABASE_URL=postgres://localhost/levy LEVY_PORT=8080 cargo run --bin levy-api
//! ```
//!
//! # Environment Variables
//!
//! * `LEVY_HOST` - Server host (default: 0.0.0.0)
//! * `LEVY_PORT` - Server port (default: 8080)
//! * `LEVY_DATABASE_URL` - PostgreSQL connection string (default: in-memory store)
//! * `LEVY_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `LEVY_TIMEZONE` - IANA timezone for the current period (default: Africa/Lagos)
//! * `LEVY_CURRENCY` - display currency (default: NGN)
//! * `LEVY_COMMIT_MAX_ATTEMPTS` - payment commit attempts (default: 3)
//! * `LEVY_COMMIT_RETRY_BACKOFF_MS` - delay between attempts (default: 200)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_levy::{InMemoryLevyStore, LevyStore, PaymentService};
use infra_db::{create_pool, run_migrations, PostgresLevyStore};
use interface_api::{config::ApiConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.timezone.name(),
        currency = %config.currency,
        "Starting estate levy API server"
    );

    let store = open_store(&config).await?;
    let service = PaymentService::new(store)
        .with_retry_policy(config.retry_policy())
        .with_timezone(config.timezone);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    let app = create_router(Arc::new(service), config);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Connects to PostgreSQL and applies migrations, or falls back to the
/// in-memory store when no database URL is configured.
async fn open_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn LevyStore>> {
    if !config.uses_database() {
        tracing::warn!("LEVY_DATABASE_URL not set, using the in-memory store");
        return Ok(Arc::new(InMemoryLevyStore::new()));
    }

    let pool = create_pool(&config.database_config())
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("running migrations")?;

    Ok(Arc::new(PostgresLevyStore::new(pool)))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
