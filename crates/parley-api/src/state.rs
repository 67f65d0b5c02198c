//! Application state shared across transport handlers.

use std::sync::Arc;
use std::time::Instant;

use parley_chat::SessionOrchestrator;
use parley_core::ParleyConfig;

use crate::registry::ConnectionRegistry;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning into handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration snapshot.
    pub config: Arc<ParleyConfig>,
    /// Per-message coordinator.
    pub orchestrator: Arc<SessionOrchestrator>,
    /// Live-connection table shared with the idle sweep.
    pub registry: Arc<ConnectionRegistry>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: ParleyConfig,
        orchestrator: SessionOrchestrator,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            registry,
            start_time: Instant::now(),
        }
    }
}
