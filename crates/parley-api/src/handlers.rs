//! REST handlers: health and the non-persistent chat shim.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub offer_id: Option<u64>,
    /// Optional session to continue; a fresh one is created if absent.
    pub session: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_connections: usize,
}

/// GET /health — liveness and connection count.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_connections: state.registry.active_count(),
    })
}

/// POST /chat — one message in, one streamed plain-text answer out.
///
/// Compatibility shim over the same pipeline as the WebSocket path, minus
/// control events and liveness nudging. Unlike the lenient WebSocket frames,
/// a shim body that is not valid JSON is the caller's bug and gets a
/// structured 400.
pub async fn chat(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let session_id = request.session.unwrap_or_else(Uuid::new_v4);

    let chunks = state
        .orchestrator
        .handle_chat(
            session_id,
            &request.message,
            request.offer_id,
            &addr.ip().to_string(),
        )
        .await;

    let stream = ReceiverStream::new(chunks).map(Ok::<_, Infallible>);

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    ))
}
