//! HTTP and WebSocket transport for the Parley gateway.
//!
//! Owns the live-connection registry, the idle-nudge background sweep, the
//! persistent WebSocket endpoint, and a non-persistent request/response
//! compatibility shim.

pub mod error;
pub mod handlers;
pub mod monitor;
pub mod registry;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use monitor::{InactivityMonitor, NUDGE_TEXT};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use routes::{create_router, start_server};
pub use state::AppState;
