//! Router setup and server entry point.

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use parley_core::error::ParleyError;
use parley_core::ParleyConfig;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/chat",
            post(handlers::chat).layer(DefaultBodyLimit::max(64 * 1024)),
        )
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        // The gateway fronts a browser widget served from arbitrary origins.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve on the configured port (localhost only).
pub async fn start_server(config: &ParleyConfig, state: AppState) -> Result<(), ParleyError> {
    let addr = format!("127.0.0.1:{}", config.general.port);

    let router = create_router(state);

    tracing::info!("Starting gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| ParleyError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
