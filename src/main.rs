//! wallet_ledger - Wallet Balance and Ledger API
//!
//! Serves deposits, withdrawals, transfers and ledger history over HTTP,
//! backed by PostgreSQL row locks for consistency.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_ledger::api::{self, SharedWallet};
use wallet_ledger::{db, Config, PgBackend, Wallet};

/// Initialize tracing/logging. Production emits JSON lines.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wallet_ledger=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        environment = %config.environment,
        lock_order = %config.lock_order,
        lock_timeout_ms = config.lock_timeout.as_millis() as u64,
        enforce_sufficient_funds = config.enforce_sufficient_funds,
        "Starting wallet_ledger server"
    );
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;
    db::ensure_schema(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let backend = PgBackend::new(pool.clone()).with_lock_timeout(config.lock_timeout);
    let wallet: SharedWallet = Arc::new(Wallet::new(backend, config.wallet_options()));
    let app = api::build_app(wallet);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
