//! State shared by every adapter: transport, cache, limiter, sweepers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStats, ResponseCache};
use crate::config::ClientConfig;
use crate::error::{GitPlatformError, Result};
use crate::http::HttpTransport;
use crate::rate_limit::{ApiRateLimiter, SlidingWindowLimiter};
use crate::sweeper::Sweeper;
use crate::transport::ApiTransport;

use super::query::MAX_PER_PAGE;
use super::repo_id::RepoId;
use super::types::Platform;

/// Plumbing an adapter delegates to.
///
/// Reads go through [`cached`](Self::cached): cache lookup, then limiter
/// admission, then the fetch. Writes go through [`write`](Self::write):
/// limiter admission, the request, then tag invalidation.
#[derive(Debug)]
pub struct ClientCore {
    platform: Platform,
    transport: ApiTransport,
    cache: Option<Arc<ResponseCache>>,
    cache_ttl: Duration,
    limiter: Option<Arc<SlidingWindowLimiter>>,
    pacer: Option<ApiRateLimiter>,
    sweepers: Vec<Sweeper>,
}

impl ClientCore {
    /// Validate `config` and assemble the shared state.
    ///
    /// Starts the cache and limiter sweepers when a tokio runtime is running.
    pub fn new(
        platform: Platform,
        config: &ClientConfig,
        http: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        config.validate(platform)?;

        let transport = ApiTransport::new(platform, config, http);

        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(ResponseCache::from_config(&config.cache)));
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit)));
        let pacer = config.pacing_rps.map(ApiRateLimiter::new);

        let mut sweepers = Vec::new();
        if let Some(cache) = &cache {
            let cache = Arc::clone(cache);
            sweepers.push(Sweeper::spawn("cache", config.sweep_interval, move || {
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::trace!(removed, "Swept expired cache entries");
                }
            }));
        }
        if let Some(limiter) = &limiter {
            let limiter = Arc::clone(limiter);
            sweepers.push(Sweeper::spawn(
                "rate-limiter",
                config.sweep_interval,
                move || {
                    let removed = limiter.cleanup();
                    if removed > 0 {
                        tracing::trace!(removed, "Dropped idle rate limit windows");
                    }
                },
            ));
        }

        Ok(Self {
            platform,
            transport,
            cache,
            cache_ttl: config.cache.ttl,
            limiter,
            pacer,
            sweepers,
        })
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }

    #[must_use]
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    #[must_use]
    pub fn limiter(&self) -> Option<&SlidingWindowLimiter> {
        self.limiter.as_deref()
    }

    /// Cache key for a GET of `path` (which already carries every query
    /// parameter).
    #[must_use]
    pub fn cache_key(&self, path: &str) -> String {
        format!("{}:GET {}", self.platform, path)
    }

    /// Admission control: optional pacing, then the sliding window keyed by
    /// platform name. A refused request is not counted.
    pub async fn gate(&self) -> Result<()> {
        if let Some(pacer) = &self.pacer {
            pacer.wait().await;
        }

        if let Some(limiter) = &self.limiter {
            let key = self.platform.as_str();
            if !limiter.is_within_limit(key) {
                let wait = limiter.get_reset_time(key);
                tracing::debug!(
                    platform = %self.platform,
                    wait_ms = wait.as_millis() as u64,
                    "Local rate limit reached, refusing request"
                );
                return Err(GitPlatformError::local_rate_limit(self.platform, wait));
            }
            limiter.record_request(key);
        }

        Ok(())
    }

    /// Cache-first read.
    ///
    /// Concurrent misses for the same key each run `fetch`; the last writer
    /// wins.
    pub async fn cached<T, F, Fut>(
        &self,
        key: String,
        tags: Vec<String>,
        force_refresh: bool,
        fetch: F,
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !force_refresh
            && let Some(cache) = &self.cache
            && let Some(hit) = cache.get::<T>(&key)
        {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(T::clone(&hit));
        }
        tracing::trace!(key = %key, force_refresh, "Cache miss");

        self.gate().await?;
        let value = fetch().await?;

        if let Some(cache) = &self.cache {
            cache.set(key, Arc::new(value.clone()), self.cache_ttl, tags);
        }
        Ok(value)
    }

    /// Rate-limited read that never touches the cache.
    pub async fn uncached<T, F, Fut>(&self, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.gate().await?;
        fetch().await
    }

    /// Mutation: admission, request, then invalidation of `tags` on success.
    pub async fn write<T, F, Fut>(&self, tags: Vec<String>, send: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.gate().await?;
        let value = send().await?;
        let removed = self.invalidate(&tags);
        tracing::debug!(platform = %self.platform, removed, "Invalidated cache after write");
        Ok(value)
    }

    /// Drop every cached entry carrying one of `tags`.
    pub fn invalidate<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.clear_by_tags(tags))
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    #[must_use]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.get_stats())
    }

    /// Stop the background sweepers. The client keeps working afterwards,
    /// with lazy expiry only.
    pub fn shutdown(&self) {
        for sweeper in &self.sweepers {
            sweeper.stop();
        }
        tracing::debug!(platform = %self.platform, "Client shut down");
    }

    /// Reject identifiers that are malformed or pinned to another platform.
    pub fn check_repo(&self, repo: &RepoId) -> Result<()> {
        if let Some(platform) = repo.platform
            && platform != self.platform
        {
            return Err(GitPlatformError::validation(
                self.platform,
                format!("{platform}:{repo} cannot be served by the {} client", self.platform),
            ));
        }
        repo.validate()
            .map_err(|e| GitPlatformError::validation(self.platform, e.to_string()))
    }

    /// Reject page numbers below 1 and sizes outside `1..=100`.
    pub fn check_paging(&self, page: u32, per_page: u32) -> Result<()> {
        if page == 0 {
            return Err(GitPlatformError::validation(
                self.platform,
                "page numbers start at 1",
            ));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(GitPlatformError::validation(
                self.platform,
                format!("per_page must be between 1 and {MAX_PER_PAGE}, got {per_page}"),
            ));
        }
        Ok(())
    }
}
