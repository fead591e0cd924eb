//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use routes::{create_router, SharedWallet};

/// Build the complete application: `/health` plus the wallet API under `/api`
pub fn build_app(wallet: SharedWallet) -> Router {
    let api_router = create_router().layer(axum::middleware::from_fn(
        middleware::logging_middleware,
    ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(wallet)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
