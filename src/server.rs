//! Progress Lookup Server
//!
//! One POST route doing the work, a health probe, and nothing else. Request
//! handling is stateless; concurrency is left entirely to the runtime.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{health_check, lookup_progress, method_not_allowed, ApiState};

/// Build the application router.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Non-POST methods on the lookup route answer 405.
        .route("/", post(lookup_progress).fallback(method_not_allowed))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ============================================================================
// SERVER STARTUP
// ============================================================================

pub async fn run_server(state: Arc<ApiState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Run progress lookup service ready");
    info!("  Listening on: {}", addr);
    info!("  Endpoints:");
    info!("    POST /       - Look up latest run progress");
    info!("    GET  /health - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
