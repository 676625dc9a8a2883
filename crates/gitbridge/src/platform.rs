//! Platform-agnostic model and client contract.
//!
//! This module defines the `PlatformClient` trait that provides a unified
//! interface over GitHub and GitLab, plus the domain types both adapters
//! normalize into.
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::platform::{ListQuery, PlatformClient, StateFilter};
//!
//! async fn open_bugs(client: &dyn PlatformClient) -> gitbridge::Result<()> {
//!     let repo = client.parse_repo_id("rust-lang/rust")?;
//!     let query = ListQuery::default().with_state(StateFilter::Open).with_label("C-bug");
//!     for issue in client.get_issues(&repo, &query).await? {
//!         println!("#{} {}", issue.number, issue.title);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod client_core;
mod query;
mod repo_id;
pub mod tags;
mod types;

pub use client::{BatchResult, PlatformClient};
pub use client_core::ClientCore;
pub use query::{
    CommitQuery, DEFAULT_PER_PAGE, IssueUpdate, ListQuery, MAX_PER_PAGE, NewIssue, PageQuery,
    SearchQuery, SearchSort, SortOrder, StateFilter,
};
pub use repo_id::{IssueRef, RepoId, RepoIdError};
pub use types::{
    Account, Capabilities, Commit, Issue, IssueState, Label, Milestone, Platform, PullRequest,
    PullRequestState, RateLimitInfo, Release, Repository, RepositoryOwner, SearchResults, User,
    UserType, Visibility,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::CacheStats;
    use crate::error::{GitPlatformError, Result};
    use crate::webhook::sign_payload;

    /// A client that only knows one repository.
    struct OneRepoClient;

    fn repository(owner: &str, name: &str) -> Repository {
        Repository {
            platform: Platform::GitHub,
            id: 1,
            owner: owner.to_string(),
            name: name.to_string(),
            full_name: format!("{owner}/{name}"),
            description: None,
            html_url: format!("https://github.com/{owner}/{name}"),
            clone_url: None,
            ssh_url: None,
            visibility: Visibility::Public,
            default_branch: Some("main".to_string()),
            is_fork: false,
            is_archived: false,
            stars: 0,
            forks: 0,
            open_issues: 0,
            language: None,
            topics: Vec::new(),
            created_at: None,
            updated_at: None,
            pushed_at: None,
            owner_account: Account {
                id: 2,
                login: owner.to_string(),
                kind: UserType::User,
                avatar_url: None,
                html_url: None,
            },
        }
    }

    fn unsupported<T>() -> Result<T> {
        Err(GitPlatformError::validation(Platform::GitHub, "unsupported"))
    }

    #[async_trait]
    impl PlatformClient for OneRepoClient {
        fn platform(&self) -> Platform {
            Platform::GitHub
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                rate_limit_endpoint: false,
                merged_state_filter: false,
                nested_namespaces: false,
                pull_request_filters: false,
            }
        }

        async fn get_repository(&self, repo: &RepoId) -> Result<Repository> {
            if repo.full_name() == "octo/hello" {
                Ok(repository("octo", "hello"))
            } else {
                Err(GitPlatformError::not_found(Platform::GitHub, repo.full_name()))
            }
        }

        async fn search_repositories(&self, _: &SearchQuery) -> Result<SearchResults<Repository>> {
            unsupported()
        }
        async fn get_issues(&self, _: &RepoId, _: &ListQuery) -> Result<Vec<Issue>> {
            unsupported()
        }
        async fn get_issue(&self, _: &IssueRef) -> Result<Issue> {
            unsupported()
        }
        async fn get_pull_requests(&self, _: &RepoId, _: &ListQuery) -> Result<Vec<PullRequest>> {
            unsupported()
        }
        async fn get_pull_request(&self, _: &IssueRef) -> Result<PullRequest> {
            unsupported()
        }
        async fn get_user(&self, _: &str) -> Result<User> {
            unsupported()
        }
        async fn get_rate_limit(&self) -> Result<RateLimitInfo> {
            unsupported()
        }
        async fn create_issue(&self, _: &RepoId, _: &NewIssue) -> Result<Issue> {
            unsupported()
        }
        async fn update_issue(&self, _: &IssueRef, _: &IssueUpdate) -> Result<Issue> {
            unsupported()
        }
        async fn list_commits(&self, _: &RepoId, _: &CommitQuery) -> Result<Vec<Commit>> {
            unsupported()
        }
        async fn list_releases(&self, _: &RepoId, _: &PageQuery) -> Result<Vec<Release>> {
            unsupported()
        }
        fn invalidate(&self, _: &[String]) -> usize {
            0
        }
        fn clear_cache(&self) {}
        fn cache_stats(&self) -> Option<CacheStats> {
            None
        }
        fn shutdown(&self) {}
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let client = OneRepoClient;
        let ids = vec![
            RepoId::new("octo", "hello"),
            RepoId::new("octo", "missing"),
            RepoId::new("octo", "hello"),
        ];
        let result = client.get_repositories(&ids).await;
        assert_eq!(result.succeeded.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert!(result.has_errors());
        assert_eq!(result.failed[0].0, RepoId::new("octo", "missing"));
        assert!(result.failed[0].1.is_not_found());
    }

    #[test]
    fn parse_repo_id_pins_platform_and_rejects_others() {
        let client = OneRepoClient;
        let id = client.parse_repo_id("octo/hello.git").expect("valid");
        assert_eq!(id.platform, Some(Platform::GitHub));
        assert_eq!(id.name, "hello");

        let err = client
            .parse_repo_id("gitlab:group/project")
            .expect_err("wrong platform");
        assert!(err.is_validation());

        let err = client.parse_repo_id("no-slash").expect_err("unparsable");
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn webhook_validation_through_the_contract() {
        let client: Arc<dyn PlatformClient> = Arc::new(OneRepoClient);
        let body = br#"{"action":"opened"}"#;
        let signature = sign_payload(body, "s3cret");
        assert!(client.validate_webhook_payload(body, &signature, "s3cret"));
        assert!(!client.validate_webhook_payload(b"{\"action\":\"closed\"}", &signature, "s3cret"));
    }

    #[test]
    fn repository_repo_id_round_trips_owner_and_name() {
        let repo = repository("octo", "hello");
        let id = repo.repo_id();
        assert_eq!(id.platform, Some(Platform::GitHub));
        assert_eq!(id.full_name(), repo.full_name);
    }
}
