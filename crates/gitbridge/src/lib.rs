//! gitbridge - a resilient client for GitHub and GitLab.
//!
//! This library provides a unified interface for reading and writing
//! repository data (repositories, issues, pull/merge requests, users,
//! commits, releases) across GitHub and GitLab. Every client carries its own
//! retrying transport, sliding-window rate limiter and TTL/tag cache.
//!
//! # Features
//!
//! - `github` / `gitlab` (default) - the provider adapters.
//! - `test-support` - exposes [`http::MockTransport`] for integration tests.
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::{ClientConfig, PlatformClient, github::GitHubClient};
//! use gitbridge::platform::ListQuery;
//!
//! let client = GitHubClient::new(&ClientConfig::github(token))?;
//! let repo = client.parse_repo_id("rust-lang/rust")?;
//! let open = client.get_issues(&repo, &ListQuery::default()).await?;
//! client.shutdown();
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod platform;
pub mod rate_limit;
pub mod retry;
pub mod sweeper;
pub mod transport;
pub mod webhook;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "gitlab")]
pub mod gitlab;

pub use cache::{CacheStats, ResponseCache};
pub use config::{CacheConfig, ClientConfig, RateLimitConfig};
pub use error::{ErrorKind, GitPlatformError, Result};
pub use platform::{
    BatchResult, Capabilities, Commit, Issue, IssueRef, IssueState, Platform, PlatformClient,
    PullRequest, PullRequestState, RateLimitInfo, Release, RepoId, Repository, User,
};
pub use rate_limit::{ApiRateLimiter, SlidingWindowLimiter};
pub use retry::RetryConfig;

/// Build a boxed client for `platform`.
///
/// Fails when the platform's adapter feature is disabled or the configuration
/// does not validate.
pub fn client_for(platform: Platform, config: &ClientConfig) -> Result<Box<dyn PlatformClient>> {
    match platform {
        #[cfg(feature = "github")]
        Platform::GitHub => Ok(Box::new(github::GitHubClient::new(config)?)),
        #[cfg(feature = "gitlab")]
        Platform::GitLab => Ok(Box::new(gitlab::GitLabClient::new(config)?)),
        #[allow(unreachable_patterns)]
        other => Err(GitPlatformError::validation(
            other,
            format!("{other} support was not compiled in"),
        )),
    }
}
