//! Sliding-window rate limiting keyed by caller identity.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use parley_core::config::GuardConfig;

/// Per-identity sliding-window request limiter.
///
/// Each identity (normally a network address) owns an ordered list of
/// request instants. A check purges entries older than the window, then
/// either refuses (at capacity) or records the new request — the whole
/// read-purge-append runs under one lock so concurrent checks for the same
/// identity cannot lose updates.
///
/// This operation never fails: the answer is only ever limited / not
/// limited. Identities are never evicted; the purge bounds growth per
/// identity but not identity cardinality.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(
            config.rate_max_requests,
            Duration::from_secs(config.rate_window_secs),
        )
    }

    /// Check (and, if allowed, record) a request for `identity`.
    ///
    /// Returns `true` when the identity is over its limit; the refused
    /// request is not recorded.
    pub fn is_rate_limited(&self, identity: &str) -> bool {
        let now = Instant::now();

        let mut windows = match self.windows.lock() {
            Ok(w) => w,
            Err(poisoned) => {
                // A panicked holder cannot leave the map structurally broken;
                // keep serving rather than failing every caller.
                tracing::warn!("rate limiter lock poisoned; continuing");
                poisoned.into_inner()
            }
        };

        let entries = windows.entry(identity.to_string()).or_default();
        entries.retain(|&t| now.duration_since(t) < self.window);

        if entries.len() >= self.max_requests {
            return true;
        }

        entries.push(now);
        false
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(max: usize, window_ms: u64) -> RateLimiter {
        RateLimiter::new(max, Duration::from_millis(window_ms))
    }

    // ---- Basic limiting ----

    #[test]
    fn test_allows_up_to_max_requests() {
        let rl = limiter(3, 10_000);
        assert!(!rl.is_rate_limited("a"));
        assert!(!rl.is_rate_limited("a"));
        assert!(!rl.is_rate_limited("a"));
    }

    #[test]
    fn test_rejects_over_limit_within_window() {
        let rl = limiter(3, 10_000);
        for _ in 0..3 {
            assert!(!rl.is_rate_limited("a"));
        }
        assert!(rl.is_rate_limited("a"));
        assert!(rl.is_rate_limited("a"));
    }

    #[test]
    fn test_identities_are_independent() {
        let rl = limiter(2, 10_000);
        assert!(!rl.is_rate_limited("a"));
        assert!(!rl.is_rate_limited("a"));
        assert!(rl.is_rate_limited("a"));
        // A different identity still has a fresh window.
        assert!(!rl.is_rate_limited("b"));
    }

    #[test]
    fn test_window_elapse_allows_again() {
        let rl = limiter(2, 50);
        assert!(!rl.is_rate_limited("a"));
        assert!(!rl.is_rate_limited("a"));
        assert!(rl.is_rate_limited("a"));

        std::thread::sleep(Duration::from_millis(60));
        assert!(!rl.is_rate_limited("a"));
    }

    #[test]
    fn test_refused_request_not_recorded() {
        let rl = limiter(1, 50);
        assert!(!rl.is_rate_limited("a"));
        // Hammer while limited; none of these should extend the window.
        for _ in 0..5 {
            assert!(rl.is_rate_limited("a"));
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(!rl.is_rate_limited("a"));
    }

    #[test]
    fn test_zero_max_requests_always_limited() {
        let rl = limiter(0, 10_000);
        assert!(rl.is_rate_limited("a"));
    }

    #[test]
    fn test_tracked_identities_grows_with_callers() {
        let rl = limiter(5, 10_000);
        rl.is_rate_limited("a");
        rl.is_rate_limited("b");
        rl.is_rate_limited("c");
        assert_eq!(rl.tracked_identities(), 3);
    }

    // ---- Concurrency ----

    #[test]
    fn test_concurrent_same_identity_no_lost_updates() {
        let rl = Arc::new(limiter(10, 10_000));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let rl = Arc::clone(&rl);
            handles.push(std::thread::spawn(move || {
                let mut allowed = 0;
                for _ in 0..10 {
                    if !rl.is_rate_limited("shared") {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }
        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 40 attempts against a budget of 10: exactly 10 admitted.
        assert_eq!(total, 10);
    }

    #[test]
    fn test_concurrent_distinct_identities() {
        let rl = Arc::new(limiter(5, 10_000));
        let mut handles = Vec::new();
        for i in 0..4 {
            let rl = Arc::clone(&rl);
            handles.push(std::thread::spawn(move || {
                let id = format!("caller-{i}");
                (0..5).filter(|_| !rl.is_rate_limited(&id)).count()
            }));
        }
        for h in handles {
            assert_eq!(h.join().unwrap(), 5);
        }
    }
}
