//! Fixed-window request rate limiter.
//!
//! A defensive client-side throttle for operations that hit paid generation
//! endpoints. Limits are per caller key (typically the user id) over a fixed
//! window; exhaustion is reported as a structured decision, never as an
//! error, and the caller chooses the UI treatment.
//!
//! Entries for idle keys are removed by a periodic background sweep so the
//! map stays bounded under many distinct keys. The sweep is a cancellable
//! task: [`RateLimiter::destroy`] stops it and clears all state, and
//! dropping the limiter aborts it.

use crate::config::RateLimitSettings;
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: DateTime<Utc>,
}

/// Resolves the caller key a check should be accounted against.
///
/// Typically backed by the host session (current user id). Resolution is
/// async because hosts may need to consult their auth layer.
#[async_trait::async_trait]
pub trait RateLimitKeyProvider: Send + Sync {
    /// The key for the current caller, or `None` when unavailable.
    async fn resolve_key(&self) -> Option<String>;
}

struct WindowEntry {
    count: u32,
    reset_at_ms: i64,
}

/// Keyed fixed-window throttle.
pub struct RateLimiter {
    settings: RateLimitSettings,
    clock: Arc<dyn Clock>,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Create a limiter without the background sweep.
    ///
    /// Useful outside an async runtime; callers are then responsible for
    /// occasionally invoking [`RateLimiter::purge_expired`].
    pub fn new(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            entries: Arc::new(Mutex::new(HashMap::new())),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a limiter with the periodic sweep running.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> Arc<Self> {
        let limiter = Arc::new(Self::new(settings, clock));

        let entries = Arc::clone(&limiter.entries);
        let sweep_clock = Arc::clone(&limiter.clock);
        let sweep_every = limiter.settings.sweep_interval();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_every);
            // The first tick fires immediately; skip it so a fresh limiter
            // does not sweep an empty map.
            interval.tick().await;
            loop {
                interval.tick().await;
                let now_ms = sweep_clock.unix_timestamp_millis();
                let removed = {
                    let mut entries = entries.lock();
                    let before = entries.len();
                    entries.retain(|_, entry| entry.reset_at_ms > now_ms);
                    before - entries.len()
                };
                if removed > 0 {
                    trace!(removed, "rate limiter sweep removed expired windows");
                }
            }
        });
        *limiter.sweeper.lock() = Some(handle);
        limiter
    }

    /// Convenience constructor with the system clock.
    pub fn start_with_system_clock(settings: RateLimitSettings) -> Arc<Self> {
        Self::start(settings, Arc::new(SystemClock))
    }

    /// Account one request against `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now_ms = self.clock.unix_timestamp_millis();
        let window_ms = self.settings.window().as_millis() as i64;
        let max = self.settings.max_requests;

        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            if now_ms > entry.reset_at_ms {
                // Window elapsed, start a fresh one.
                entry.count = 1;
                entry.reset_at_ms = now_ms + window_ms;
                return RateLimitDecision {
                    allowed: true,
                    remaining: max.saturating_sub(1),
                    reset_at: to_datetime(entry.reset_at_ms),
                };
            }

            if entry.count >= max {
                return RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_at: to_datetime(entry.reset_at_ms),
                };
            }

            entry.count += 1;
            return RateLimitDecision {
                allowed: true,
                remaining: max.saturating_sub(entry.count),
                reset_at: to_datetime(entry.reset_at_ms),
            };
        }

        let reset_at_ms = now_ms + window_ms;
        entries.insert(
            key.to_string(),
            WindowEntry {
                count: 1,
                reset_at_ms,
            },
        );
        RateLimitDecision {
            allowed: true,
            remaining: max.saturating_sub(1),
            reset_at: to_datetime(reset_at_ms),
        }
    }

    /// Resolve the caller key and check it.
    ///
    /// Fail-open: when no key can be resolved the request is allowed with a
    /// full window, since blocking an unidentified caller would turn an auth
    /// hiccup into a hard failure.
    pub async fn check_with(&self, provider: &dyn RateLimitKeyProvider) -> RateLimitDecision {
        match provider.resolve_key().await {
            Some(key) => self.check(&key),
            None => {
                debug!("rate limit key unavailable, allowing request");
                let reset_at_ms =
                    self.clock.unix_timestamp_millis() + self.settings.window().as_millis() as i64;
                RateLimitDecision {
                    allowed: true,
                    remaining: self.settings.max_requests,
                    reset_at: to_datetime(reset_at_ms),
                }
            }
        }
    }

    /// Remove windows that have already expired. Returns how many were
    /// removed.
    pub fn purge_expired(&self) -> usize {
        let now_ms = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at_ms > now_ms);
        before - entries.len()
    }

    /// Number of tracked keys (including not-yet-swept expired windows).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Stop the background sweep and drop all entries.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.entries.lock().clear();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }
}

fn to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct TestClock {
        now_ms: Mutex<i64>,
    }

    impl TestClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now_ms: Mutex::new(10_000),
            })
        }

        fn advance(&self, delta: Duration) {
            *self.now_ms.lock() += delta.as_millis() as i64;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(*self.now_ms.lock()).unwrap()
        }
    }

    fn settings(max: u32, window_secs: u64) -> RateLimitSettings {
        RateLimitSettings {
            max_requests: max,
            window_secs,
            sweep_interval_secs: 60,
        }
    }

    #[test]
    fn fixed_window_sequence() {
        let clock = TestClock::new();
        let limiter = RateLimiter::new(settings(3, 1), clock.clone());

        let decisions: Vec<bool> = (0..4).map(|_| limiter.check("user-1").allowed).collect();
        assert_eq!(decisions, vec![true, true, true, false]);

        let denied = limiter.check("user-1");
        assert_eq!(denied.remaining, 0);
        let old_reset = denied.reset_at;

        clock.advance(Duration::from_millis(1_001));
        let fresh = limiter.check("user-1");
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
        assert!(fresh.reset_at > old_reset);
    }

    #[test]
    fn remaining_counts_down() {
        let clock = TestClock::new();
        let limiter = RateLimiter::new(settings(3, 60), clock);

        assert_eq!(limiter.check("k").remaining, 2);
        assert_eq!(limiter.check("k").remaining, 1);
        assert_eq!(limiter.check("k").remaining, 0);
        assert!(!limiter.check("k").allowed);
    }

    #[test]
    fn keys_are_independent() {
        let clock = TestClock::new();
        let limiter = RateLimiter::new(settings(1, 60), clock);

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn purge_removes_only_expired_windows() {
        let clock = TestClock::new();
        let limiter = RateLimiter::new(settings(5, 1), clock.clone());

        limiter.check("old");
        clock.advance(Duration::from_millis(1_500));
        limiter.check("fresh");

        assert_eq!(limiter.purge_expired(), 1);
        assert_eq!(limiter.len(), 1);
    }

    #[tokio::test]
    async fn destroy_stops_sweeper_and_clears() {
        let limiter = RateLimiter::start(settings(3, 60), TestClock::new());
        limiter.check("user-1");
        assert_eq!(limiter.len(), 1);

        limiter.destroy();
        assert!(limiter.is_empty());
        assert!(limiter.sweeper.lock().is_none());
    }

    struct FixedKey(Option<String>);

    #[async_trait::async_trait]
    impl RateLimitKeyProvider for FixedKey {
        async fn resolve_key(&self) -> Option<String> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn check_with_resolves_key() {
        let limiter = RateLimiter::new(settings(1, 60), TestClock::new());
        let provider = FixedKey(Some("user-9".to_string()));

        assert!(limiter.check_with(&provider).await.allowed);
        assert!(!limiter.check_with(&provider).await.allowed);
    }

    #[tokio::test]
    async fn check_with_fails_open_without_key() {
        let limiter = RateLimiter::new(settings(1, 60), TestClock::new());
        let provider = FixedKey(None);

        // Repeated anonymous checks never consume a window.
        assert!(limiter.check_with(&provider).await.allowed);
        assert!(limiter.check_with(&provider).await.allowed);
        assert!(limiter.is_empty());
    }
}
