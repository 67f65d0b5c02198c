//! Live-connection table with per-connection liveness state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Opaque handle identifying one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct ConnectionEntry {
    outbound: mpsc::UnboundedSender<String>,
    last_activity: Instant,
    alerted: bool,
    nudge_enabled: bool,
}

/// Owns all per-connection state.
///
/// Both the per-connection message path and the background idle sweep go
/// through these methods; the single interior lock makes each mutation
/// atomic with respect to the other path. Nothing outside the registry
/// holds a reference to an entry.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, ConnectionEntry>> {
        match self.connections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("connection registry lock poisoned; continuing");
                poisoned.into_inner()
            }
        }
    }

    /// Register a new connection. Nudging starts enabled.
    pub fn connect(&self, outbound: mpsc::UnboundedSender<String>) -> ConnectionId {
        let id = ConnectionId(Uuid::new_v4());
        self.lock().insert(
            id,
            ConnectionEntry {
                outbound,
                last_activity: Instant::now(),
                alerted: false,
                nudge_enabled: true,
            },
        );
        id
    }

    /// Remove a connection and all its state. Idempotent.
    pub fn disconnect(&self, id: ConnectionId) {
        self.lock().remove(&id);
    }

    /// Stamp activity to now and clear any pending alert.
    pub fn touch(&self, id: ConnectionId) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.last_activity = Instant::now();
            entry.alerted = false;
        }
    }

    /// Set whether the idle sweep may nudge this connection.
    pub fn set_nudge_enabled(&self, id: ConnectionId, enabled: bool) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.nudge_enabled = enabled;
        }
    }

    /// Deliver a message. False when the connection is gone or its channel
    /// is closed.
    pub fn send(&self, id: ConnectionId, text: &str) -> bool {
        match self.lock().get(&id) {
            Some(entry) => entry.outbound.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    /// Snapshot of current connection ids, safe to iterate while
    /// connections come and go.
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        self.lock().keys().copied().collect()
    }

    /// Number of live connections.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Atomically decide whether this connection is due a nudge.
    ///
    /// True when idle past `threshold`, not yet alerted this idle period,
    /// and nudge-eligible; the alert flag is set in the same critical
    /// section so two overlapping sweeps cannot double-nudge.
    pub fn due_for_nudge(&self, id: ConnectionId, now: Instant, threshold: Duration) -> bool {
        match self.lock().get_mut(&id) {
            Some(entry) => {
                let idle = now.saturating_duration_since(entry.last_activity);
                if idle > threshold && !entry.alerted && entry.nudge_enabled {
                    entry.alerted = true;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Rewind a connection's activity stamp (test support).
    #[doc(hidden)]
    pub fn backdate_activity(&self, id: ConnectionId, age: Duration) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.last_activity = Instant::now() - age;
        }
    }

    /// Whether the connection is currently nudge-eligible (test support).
    #[doc(hidden)]
    pub fn is_nudge_enabled(&self, id: ConnectionId) -> bool {
        self.lock().get(&id).map(|e| e.nudge_enabled).unwrap_or(false)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
