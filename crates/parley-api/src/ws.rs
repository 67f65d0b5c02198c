//! Persistent WebSocket endpoint.
//!
//! One upgrade per client: the writer task drains the connection's outbound
//! channel (answers, corrections, and idle nudges all flow through it), and
//! the reader loop processes inbound frames strictly in arrival order.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use parley_chat::NudgeDirective;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Session to bind this connection to; a fresh one is created if absent.
    pub session: Option<Uuid>,
}

/// GET /ws — upgrade to a persistent conversation channel.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let session_id = params.session.unwrap_or_else(Uuid::new_v4);
    ws.on_upgrade(move |socket| client_loop(socket, state, session_id, addr))
}

async fn client_loop(socket: WebSocket, state: AppState, session_id: Uuid, addr: SocketAddr) {
    let (mut sink, mut inbound) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let conn_id = state.registry.connect(outbound_tx);
    info!(conn = %conn_id, session = %session_id, peer = %addr, "connection opened");

    // Writer: everything the gateway says to this client goes through the
    // registry channel, so the idle sweep and the answer path share one
    // ordered outbound stream.
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let identity = addr.ip().to_string();

    // Reader: frames from one client are handled sequentially; two messages
    // from the same connection never overlap.
    while let Some(Ok(frame)) = inbound.next().await {
        match frame {
            Message::Text(raw) => {
                state.registry.touch(conn_id);

                let reply = state
                    .orchestrator
                    .handle_message(session_id, raw.as_str(), &identity)
                    .await;

                match reply.nudge {
                    NudgeDirective::Enable => state.registry.set_nudge_enabled(conn_id, true),
                    NudgeDirective::Disable => state.registry.set_nudge_enabled(conn_id, false),
                    NudgeDirective::Keep => {}
                }

                let mut chunks = reply.chunks;
                while let Some(chunk) = chunks.recv().await {
                    if !state.registry.send(conn_id, &chunk) {
                        // Client gone; dropping the receiver unwinds the
                        // in-flight generation stream.
                        break;
                    }
                }
            }
            Message::Close(_) => break,
            // Ping/pong handled by the protocol layer.
            _ => {}
        }
    }

    state.registry.disconnect(conn_id);
    writer.abort();
    info!(conn = %conn_id, "connection closed");
}
