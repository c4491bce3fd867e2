//! Router setup and server startup.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use doki_core::error::{DokiError, Result};

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Build the router. Body size and rate limits come from `state.config.api`.
pub fn create_router(state: AppState) -> Router {
    let limiter = RateLimiter::new(state.config.api.rate_limit_per_sec);
    let max_body_bytes = state.config.api.max_body_bytes;

    let limited_routes = Router::new()
        .route("/generate", post(handlers::generate))
        .route(
            "/conversations/{user_id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(limiter));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(limited_routes)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `general.host:general.port` and serve until ctrl-c.
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.general.host, state.config.general.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DokiError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DokiError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
