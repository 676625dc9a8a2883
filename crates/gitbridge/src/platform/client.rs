use async_trait::async_trait;

use crate::cache::CacheStats;
use crate::error::{GitPlatformError, Result, short_error_message};
use crate::webhook;

use super::query::{CommitQuery, IssueUpdate, ListQuery, NewIssue, PageQuery, SearchQuery};
use super::repo_id::{IssueRef, RepoId};
use super::types::{
    Capabilities, Commit, Issue, Platform, PullRequest, RateLimitInfo, Release, Repository,
    SearchResults, User,
};

/// Outcome of a batch read: every item either succeeded or failed on its own.
#[derive(Debug, Clone)]
pub struct BatchResult<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(RepoId, GitPlatformError)>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Provider-neutral client contract.
///
/// Every read is cache-first (unless the query asks for a refresh) and gated
/// by the local rate limiter; every write invalidates the cache tags of the
/// collections it touches. Errors are always [`GitPlatformError`].
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Which platform this client talks to.
    fn platform(&self) -> Platform;

    /// Optional features of this provider.
    fn capabilities(&self) -> Capabilities;

    async fn get_repository(&self, repo: &RepoId) -> Result<Repository>;

    async fn search_repositories(&self, query: &SearchQuery)
    -> Result<SearchResults<Repository>>;

    /// List issues. Pull/merge requests are never included.
    async fn get_issues(&self, repo: &RepoId, query: &ListQuery) -> Result<Vec<Issue>>;

    async fn get_issue(&self, issue: &IssueRef) -> Result<Issue>;

    async fn get_pull_requests(&self, repo: &RepoId, query: &ListQuery)
    -> Result<Vec<PullRequest>>;

    async fn get_pull_request(&self, pr: &IssueRef) -> Result<PullRequest>;

    async fn get_user(&self, username: &str) -> Result<User>;

    /// Current quota. Never served from the cache.
    async fn get_rate_limit(&self) -> Result<RateLimitInfo>;

    async fn create_issue(&self, repo: &RepoId, issue: &NewIssue) -> Result<Issue>;

    async fn update_issue(&self, issue: &IssueRef, update: &IssueUpdate) -> Result<Issue>;

    async fn list_commits(&self, repo: &RepoId, query: &CommitQuery) -> Result<Vec<Commit>>;

    async fn list_releases(&self, repo: &RepoId, query: &PageQuery) -> Result<Vec<Release>>;

    /// Drop cached entries carrying any of `tags` (see [`super::tags`]).
    fn invalidate(&self, tags: &[String]) -> usize;

    fn clear_cache(&self);

    /// `None` when caching is disabled.
    fn cache_stats(&self) -> Option<CacheStats>;

    /// Stop background sweeps. Requests still work afterwards.
    fn shutdown(&self);

    /// Verify an HMAC-SHA256 webhook signature over the raw body.
    fn validate_webhook_payload(&self, payload: &[u8], signature: &str, secret: &str) -> bool {
        webhook::verify_signature(payload, signature, secret)
    }

    /// Parse `[platform:]owner/repo[.git]` for this client.
    fn parse_repo_id(&self, input: &str) -> Result<RepoId> {
        let platform = self.platform();
        let id = RepoId::parse(input)
            .map_err(|e| GitPlatformError::validation(platform, e.to_string()))?;
        match id.platform {
            Some(other) if other != platform => Err(GitPlatformError::validation(
                platform,
                format!("{input:?} names {other}, but this is a {platform} client"),
            )),
            _ => Ok(id.on(platform)),
        }
    }

    /// Fetch several repositories, isolating failures per item.
    async fn get_repositories(&self, repos: &[RepoId]) -> BatchResult<Repository> {
        let mut result = BatchResult::default();
        for repo in repos {
            match self.get_repository(repo).await {
                Ok(found) => result.succeeded.push(found),
                Err(err) => {
                    tracing::warn!(
                        platform = %self.platform(),
                        repo = %repo,
                        "Failed to fetch repository: {}",
                        short_error_message(&err)
                    );
                    result.failed.push((repo.clone(), err));
                }
            }
        }
        result
    }
}
