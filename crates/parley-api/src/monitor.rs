//! Background idle sweep that nudges silent connections.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use parley_core::config::LivenessConfig;

use crate::registry::ConnectionRegistry;

/// Fixed liveness nudge sent to idle connections.
pub const NUDGE_TEXT: &str = "Are you still there? Let me know if you need any more help.";

/// Periodic sweep over the connection registry.
///
/// Each connection moves ACTIVE → idle-pending once it has been silent past
/// the threshold, gets at most one nudge per idle period, and re-arms on
/// any activity. Connections whose nudge delivery fails are disconnected;
/// one bad connection never aborts the sweep.
pub struct InactivityMonitor {
    registry: Arc<ConnectionRegistry>,
    idle_threshold: Duration,
    sweep_interval: Duration,
}

impl InactivityMonitor {
    pub fn new(registry: Arc<ConnectionRegistry>, config: &LivenessConfig) -> Self {
        Self {
            registry,
            idle_threshold: Duration::from_secs(config.idle_threshold_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    /// One pass over a snapshot of current connections.
    pub fn sweep_once(&self) {
        let now = Instant::now();
        for id in self.registry.snapshot() {
            // A connection closing between snapshot and here is not due.
            if self.registry.due_for_nudge(id, now, self.idle_threshold) {
                debug!(conn = %id, "nudging idle connection");
                if !self.registry.send(id, NUDGE_TEXT) {
                    warn!(conn = %id, "nudge delivery failed; disconnecting");
                    self.registry.disconnect(id);
                }
            }
        }
    }

    /// Run the sweep for the lifetime of the process.
    pub async fn run(self) {
        info!(
            idle_threshold_secs = self.idle_threshold.as_secs(),
            sweep_interval_secs = self.sweep_interval.as_secs(),
            "inactivity monitor started"
        );
        let mut interval = tokio::time::interval(self.sweep_interval);
        loop {
            interval.tick().await;
            self.sweep_once();
        }
    }
}
