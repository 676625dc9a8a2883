//! Local rate limiting.
//!
//! Two independent mechanisms live here:
//!
//! - [`SlidingWindowLimiter`]: per-key admission control counting requests in
//!   a trailing window. Checking and recording are separate calls, so a
//!   request that was refused never consumes budget.
//! - [`ApiRateLimiter`]: an optional GCRA pacer (via `governor`) that spreads
//!   requests evenly instead of letting a whole window's budget burst out.
//!
//! Both are advisory. The transport still handles upstream 429s.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-key sliding-window rate limiter.
///
/// Timestamps come from [`tokio::time::Instant`], so paused-clock tests can
/// advance the window deterministically.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.limit, config.window)
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop timestamps that have left the window.
    fn prune(window: Duration, stamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = stamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether another request for `key` fits in the current window.
    #[must_use]
    pub fn is_within_limit(&self, key: &str) -> bool {
        self.get_remaining(key) > 0
    }

    /// Count one request for `key` at the current instant.
    pub fn record_request(&self, key: &str) {
        let now = Instant::now();
        let mut windows = self.lock();
        let stamps = windows.entry(key.to_string()).or_default();
        Self::prune(self.window, stamps, now);
        stamps.push_back(now);
    }

    /// Requests still admissible for `key` in the current window.
    #[must_use]
    pub fn get_remaining(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut windows = self.lock();
        match windows.get_mut(key) {
            Some(stamps) => {
                Self::prune(self.window, stamps, now);
                self.limit.saturating_sub(stamps.len())
            }
            None => self.limit,
        }
    }

    /// Time until the oldest retained request leaves the window.
    ///
    /// Zero when nothing is tracked for `key`.
    #[must_use]
    pub fn get_reset_time(&self, key: &str) -> Duration {
        let now = Instant::now();
        let mut windows = self.lock();
        let Some(stamps) = windows.get_mut(key) else {
            return Duration::ZERO;
        };
        Self::prune(self.window, stamps, now);
        stamps
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Prune every window and forget keys with nothing left in them.
    ///
    /// Returns the number of keys removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, stamps| {
            Self::prune(self.window, stamps, now);
            !stamps.is_empty()
        });
        before - windows.len()
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }
}

/// A standalone API pacer using the governor crate.
///
/// # Example
///
/// ```ignore
/// use gitbridge::rate_limit::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
///
/// // Before each API call:
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new pacer with the specified requests per second.
    ///
    /// A value of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed by the pacer.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    /// Take a slot without waiting. Returns false when the caller would have
    /// to wait.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn refuses_after_limit_and_recovers_after_window() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_millis(1_000));

        for _ in 0..3 {
            assert!(limiter.is_within_limit("github"));
            limiter.record_request("github");
        }
        assert!(!limiter.is_within_limit("github"));
        assert_eq!(limiter.get_remaining("github"), 0);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert!(limiter.is_within_limit("github"));
        assert_eq!(limiter.get_remaining("github"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        limiter.record_request("github");
        assert!(!limiter.is_within_limit("github"));
        assert!(limiter.is_within_limit("gitlab"));
        assert_eq!(limiter.get_remaining("gitlab"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn checking_does_not_consume_budget() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        for _ in 0..10 {
            assert!(limiter.is_within_limit("github"));
        }
        assert_eq!(limiter.get_remaining("github"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_one_request_at_a_time() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(10));
        limiter.record_request("k");
        tokio::time::advance(Duration::from_secs(4)).await;
        limiter.record_request("k");
        assert!(!limiter.is_within_limit("k"));
        assert_eq!(limiter.get_reset_time("k"), Duration::from_secs(6));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(limiter.get_remaining("k"), 1);
        assert_eq!(limiter.get_reset_time("k"), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_time_is_zero_for_unknown_key() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(10));
        assert_eq!(limiter.get_reset_time("nobody"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_removes_only_empty_windows() {
        let limiter = SlidingWindowLimiter::new(5, Duration::from_secs(10));
        limiter.record_request("old");
        tokio::time::advance(Duration::from_secs(8)).await;
        limiter.record_request("fresh");
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(limiter.tracked_keys(), 2);
        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.get_remaining("fresh"), 4);
    }

    #[tokio::test]
    async fn api_rate_limiter_allows_first_request_immediately() {
        let limiter = ApiRateLimiter::new(5);
        assert!(limiter.try_acquire());
        limiter.wait().await;
    }

    #[test]
    fn api_rate_limiter_zero_rps_falls_back_to_one() {
        let limiter = ApiRateLimiter::new(0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
