//! Retry policy shared by both platform adapters.
//!
//! The policy only computes *when* to retry. Deciding *whether* an error is
//! retryable lives on [`GitPlatformError`](crate::GitPlatformError), and the
//! request loop itself lives in [`crate::transport`].

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

/// Default delay before the first retry, in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Upper bound for any single retry delay, in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Default multiplier between consecutive delays.
pub const DEFAULT_BACKOFF_FACTOR: f32 = 2.0;

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after every retry.
    pub factor: f32,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts (not counting the first request).
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            factor: DEFAULT_BACKOFF_FACTOR,
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Set the growth factor between consecutive delays.
    #[must_use]
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(self.factor)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }

    /// The sequence of delays to sleep between attempts.
    ///
    /// Yields at most `max_retries` items. Jitter can push a backon delay past
    /// its configured maximum, so every item is clamped to `max_delay`.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + Send + use<> {
        let max_delay = self.max_delay;
        self.clone()
            .into_backoff()
            .build()
            .map(move |delay| delay.min(max_delay))
    }

    /// Delay before the next retry, or `None` once the budget is spent.
    ///
    /// A server-requested wait (Retry-After, reset header) replaces the
    /// backoff delay. Either way the result never exceeds `max_delay`.
    #[must_use]
    pub fn next_delay(
        &self,
        backoff: Option<Duration>,
        server_wait: Option<Duration>,
    ) -> Option<Duration> {
        backoff.map(|delay| server_wait.unwrap_or(delay).min(self.max_delay))
    }
}

/// Build the default exponential backoff strategy for platform operations.
///
/// - Initial delay: 1 second
/// - Growth factor: 2
/// - Maximum delay: 60 seconds
/// - Maximum retries: 3
/// - Jitter: enabled
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}
