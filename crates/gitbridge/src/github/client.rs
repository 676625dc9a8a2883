//! GitHub client implementing [`PlatformClient`].

use std::sync::Arc;

use async_trait::async_trait;

use super::convert;
use super::types::{
    CreateIssueBody, GitHubCommit, GitHubIssue, GitHubPullRequest, GitHubRateLimitResponse,
    GitHubRelease, GitHubRepository, GitHubSearchResponse, GitHubUser, UpdateIssueBody,
};
use crate::cache::CacheStats;
use crate::config::ClientConfig;
use crate::error::{GitPlatformError, Result};
use crate::http::{HttpMethod, HttpTransport, ReqwestTransport};
use crate::platform::{
    Capabilities, ClientCore, Commit, CommitQuery, Issue, IssueRef, IssueState, IssueUpdate,
    ListQuery, NewIssue, PageQuery, Platform, PlatformClient, PullRequest, PullRequestState,
    RateLimitInfo, Release, RepoId, Repository, SearchQuery, SearchResults, SearchSort, StateFilter,
    User, tags,
};
use crate::transport::path_with_query;

const PLATFORM: Platform = Platform::GitHub;

/// GitHub REST API client.
///
/// Each instance owns its cache, limiter and sweepers; call
/// [`PlatformClient::shutdown`] when done with it.
///
/// # Example
///
/// ```ignore
/// use gitbridge::config::ClientConfig;
/// use gitbridge::github::GitHubClient;
///
/// let client = GitHubClient::new(&ClientConfig::github(token))?;
/// let repo = client.get_repository(&"rust-lang/rust".parse()?).await?;
/// ```
#[derive(Debug)]
pub struct GitHubClient {
    core: ClientCore,
}

impl GitHubClient {
    /// Create a client backed by reqwest.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = ReqwestTransport::with_timeout(config.timeout)
            .map_err(|e| GitPlatformError::from_http_error(PLATFORM, e))?;
        Self::with_transport(config, Arc::new(http))
    }

    /// Create a client on top of an arbitrary HTTP transport.
    pub fn with_transport(config: &ClientConfig, http: Arc<dyn HttpTransport>) -> Result<Self> {
        Ok(Self {
            core: ClientCore::new(PLATFORM, config, http)?,
        })
    }

    /// Shared plumbing (transport, cache, limiter).
    #[must_use]
    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    /// `/repos/{owner}/{repo}` after validating the identifier.
    fn repo_path(&self, repo: &RepoId) -> Result<String> {
        self.core.check_repo(repo)?;
        if repo.owner.contains('/') {
            return Err(GitPlatformError::validation(
                PLATFORM,
                format!("GitHub owners cannot be nested: {repo}"),
            ));
        }
        Ok(format!("/repos/{}/{}", repo.owner, repo.name))
    }

    fn paging(page: u32, per_page: u32) -> [(&'static str, String); 2] {
        [("page", page.to_string()), ("per_page", per_page.to_string())]
    }
}

fn login_matches(login: Option<&str>, wanted: &str) -> bool {
    login.is_some_and(|login| login.eq_ignore_ascii_case(wanted))
}

/// Client-side filters for pull request listings, which GitHub cannot apply
/// server side.
fn pull_request_matches(pr: &PullRequest, query: &ListQuery) -> bool {
    let state_ok = match query.state {
        StateFilter::Open => pr.state == PullRequestState::Open,
        StateFilter::Closed => pr.state == PullRequestState::Closed,
        StateFilter::Merged => pr.state == PullRequestState::Merged,
        StateFilter::All => true,
    };
    let labels_ok = query.labels.iter().all(|wanted| {
        pr.labels
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(wanted))
    });
    let assignee_ok = query.assignee.as_deref().is_none_or(|wanted| {
        pr.assignees
            .iter()
            .any(|a| login_matches(Some(a.login.as_str()), wanted))
    });
    let author_ok = query.author.as_deref().is_none_or(|wanted| {
        login_matches(pr.author.as_ref().map(|a| a.login.as_str()), wanted)
    });
    state_ok && labels_ok && assignee_ok && author_ok
}

#[async_trait]
impl PlatformClient for GitHubClient {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            rate_limit_endpoint: true,
            merged_state_filter: false,
            nested_namespaces: false,
            pull_request_filters: false,
        }
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn get_repository(&self, repo: &RepoId) -> Result<Repository> {
        let path = self.repo_path(repo)?;
        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::repo(PLATFORM, repo)],
                false,
                move || async move {
                    let raw: GitHubRepository = api.get_json(&path).await?;
                    Ok(convert::repository(raw))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(query = %query.query))]
    async fn search_repositories(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchResults<Repository>> {
        if query.query.trim().is_empty() {
            return Err(GitPlatformError::validation(PLATFORM, "empty search query"));
        }
        self.core.check_paging(query.page, query.per_page)?;

        let mut params = vec![("q", query.query.clone())];
        if let Some(sort) = query.sort {
            let sort = match sort {
                SearchSort::Stars => "stars",
                SearchSort::Forks => "forks",
                SearchSort::Updated => "updated",
            };
            params.push(("sort", sort.to_string()));
            params.push(("order", query.order.as_str().to_string()));
        }
        params.extend(Self::paging(query.page, query.per_page));
        let path = path_with_query("/search/repositories", &params);

        let api = self.core.transport();
        let (page, per_page) = (query.page, query.per_page);
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::search(PLATFORM)],
                query.force_refresh,
                move || async move {
                    let response = api.get(&path).await?;
                    let info = response.page_info();
                    let raw: GitHubSearchResponse<GitHubRepository> = response.json()?;
                    if raw.incomplete_results {
                        tracing::debug!(path = %path, "GitHub returned incomplete search results");
                    }
                    Ok(SearchResults {
                        items: raw.items.into_iter().map(convert::repository).collect(),
                        total_count: raw.total_count,
                        has_next: info.has_next,
                        has_previous: info.has_previous || page > 1,
                        page,
                        per_page,
                    })
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn get_issues(&self, repo: &RepoId, query: &ListQuery) -> Result<Vec<Issue>> {
        let base = self.repo_path(repo)?;
        self.core.check_paging(query.page, query.per_page)?;
        if query.state == StateFilter::Merged {
            return Err(GitPlatformError::validation(
                PLATFORM,
                "the merged state only applies to pull requests",
            ));
        }

        let mut params = vec![("state", query.state.as_str().to_string())];
        if !query.labels.is_empty() {
            params.push(("labels", query.labels.join(",")));
        }
        if let Some(assignee) = &query.assignee {
            params.push(("assignee", assignee.clone()));
        }
        if let Some(author) = &query.author {
            params.push(("creator", author.clone()));
        }
        params.extend(Self::paging(query.page, query.per_page));
        let path = path_with_query(&format!("{base}/issues"), &params);

        let api = self.core.transport();
        let repo_id = repo.clone();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![
                    tags::issues(PLATFORM, repo),
                    tags::issues_in_state(PLATFORM, repo, query.state),
                ],
                query.force_refresh,
                move || async move {
                    let raw: Vec<GitHubIssue> = api.get_json(&path).await?;
                    Ok(raw
                        .into_iter()
                        .filter(|item| !item.is_pull_request())
                        .map(|item| convert::issue(item, &repo_id))
                        .collect())
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(issue = %issue))]
    async fn get_issue(&self, issue: &IssueRef) -> Result<Issue> {
        let path = format!("{}/issues/{}", self.repo_path(&issue.repo)?, issue.number);
        let api = self.core.transport();
        let target = issue.clone();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::issue(PLATFORM, &issue.repo, issue.number)],
                false,
                move || async move {
                    let raw: GitHubIssue = api.get_json(&path).await?;
                    if raw.is_pull_request() {
                        return Err(GitPlatformError::not_found(
                            PLATFORM,
                            format!("issue {target} (it is a pull request)"),
                        ));
                    }
                    Ok(convert::issue(raw, &target.repo))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn get_pull_requests(
        &self,
        repo: &RepoId,
        query: &ListQuery,
    ) -> Result<Vec<PullRequest>> {
        let base = self.repo_path(repo)?;
        self.core.check_paging(query.page, query.per_page)?;

        // GitHub has no merged filter: merged pull requests are closed ones.
        let state = match query.state {
            StateFilter::Open => "open",
            StateFilter::Closed | StateFilter::Merged => "closed",
            StateFilter::All => "all",
        };
        let mut params = vec![("state", state.to_string())];
        params.extend(Self::paging(query.page, query.per_page));
        let path = path_with_query(&format!("{base}/pulls"), &params);

        let api = self.core.transport();
        let repo_id = repo.clone();
        let filters = query.clone();
        // The key carries the client-side filters too; the path alone does not.
        let key = format!(
            "{} labels={} assignee={} author={} state={}",
            self.core.cache_key(&path),
            query.labels.join(","),
            query.assignee.as_deref().unwrap_or_default(),
            query.author.as_deref().unwrap_or_default(),
            query.state,
        );
        self.core
            .cached(
                key,
                vec![tags::pulls(PLATFORM, repo)],
                query.force_refresh,
                move || async move {
                    let raw: Vec<GitHubPullRequest> = api.get_json(&path).await?;
                    Ok(raw
                        .into_iter()
                        .map(|pr| convert::pull_request(pr, &repo_id))
                        .filter(|pr| pull_request_matches(pr, &filters))
                        .collect())
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(pr = %pr))]
    async fn get_pull_request(&self, pr: &IssueRef) -> Result<PullRequest> {
        let path = format!("{}/pulls/{}", self.repo_path(&pr.repo)?, pr.number);
        let api = self.core.transport();
        let repo_id = pr.repo.clone();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::pull(PLATFORM, &pr.repo, pr.number)],
                false,
                move || async move {
                    let raw: GitHubPullRequest = api.get_json(&path).await?;
                    Ok(convert::pull_request(raw, &repo_id))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(username = %username))]
    async fn get_user(&self, username: &str) -> Result<User> {
        let login = username.trim();
        if login.is_empty() || login.contains(['/', '?', '#', ' ']) {
            return Err(GitPlatformError::validation(
                PLATFORM,
                format!("invalid username {username:?}"),
            ));
        }
        let path = format!("/users/{login}");
        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::user(PLATFORM, login)],
                false,
                move || async move {
                    let raw: GitHubUser = api.get_json(&path).await?;
                    Ok(convert::user(raw))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all)]
    async fn get_rate_limit(&self) -> Result<RateLimitInfo> {
        let api = self.core.transport();
        self.core
            .uncached(move || async move {
                let raw: GitHubRateLimitResponse = api.get_json("/rate_limit").await?;
                convert::rate_limit(&raw.resources.core, "core")
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn create_issue(&self, repo: &RepoId, issue: &NewIssue) -> Result<Issue> {
        let path = format!("{}/issues", self.repo_path(repo)?);
        if issue.title.trim().is_empty() {
            return Err(GitPlatformError::validation(PLATFORM, "issue title is empty"));
        }
        let body = CreateIssueBody {
            title: &issue.title,
            body: issue.body.as_deref(),
            labels: &issue.labels,
            assignees: &issue.assignees,
            milestone: issue.milestone,
        };

        let api = self.core.transport();
        self.core
            .write(vec![tags::issues(PLATFORM, repo)], move || async move {
                let raw: GitHubIssue = api
                    .send_json(HttpMethod::Post, &path, &body)
                    .await?
                    .json()?;
                Ok(convert::issue(raw, repo))
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(issue = %issue))]
    async fn update_issue(&self, issue: &IssueRef, update: &IssueUpdate) -> Result<Issue> {
        let path = format!("{}/issues/{}", self.repo_path(&issue.repo)?, issue.number);
        if update.is_empty() {
            return Err(GitPlatformError::validation(PLATFORM, "nothing to update"));
        }
        let body = UpdateIssueBody {
            title: update.title.as_deref(),
            body: update.body.as_deref(),
            state: update.state.map(|state| match state {
                IssueState::Open => "open",
                IssueState::Closed => "closed",
            }),
            labels: update.labels.as_deref(),
            assignees: update.assignees.as_deref(),
            milestone: update.milestone,
        };

        let api = self.core.transport();
        self.core
            .write(
                // The issues endpoint also edits the pull request with this number.
                vec![
                    tags::issues(PLATFORM, &issue.repo),
                    tags::issue(PLATFORM, &issue.repo, issue.number),
                    tags::pulls(PLATFORM, &issue.repo),
                    tags::pull(PLATFORM, &issue.repo, issue.number),
                ],
                move || async move {
                    let raw: GitHubIssue = api
                        .send_json(HttpMethod::Patch, &path, &body)
                        .await?
                        .json()?;
                    Ok(convert::issue(raw, &issue.repo))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn list_commits(&self, repo: &RepoId, query: &CommitQuery) -> Result<Vec<Commit>> {
        let base = self.repo_path(repo)?;
        self.core
            .check_paging(query.paging.page, query.paging.per_page)?;

        let mut params = Vec::new();
        if let Some(sha) = &query.ref_name {
            params.push(("sha", sha.clone()));
        }
        if let Some(file) = &query.path {
            params.push(("path", file.clone()));
        }
        params.extend(Self::paging(query.paging.page, query.paging.per_page));
        let path = path_with_query(&format!("{base}/commits"), &params);

        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::commits(PLATFORM, repo)],
                query.paging.force_refresh,
                move || async move {
                    let raw: Vec<GitHubCommit> = api.get_json(&path).await?;
                    Ok(raw.into_iter().map(convert::commit).collect())
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn list_releases(&self, repo: &RepoId, query: &PageQuery) -> Result<Vec<Release>> {
        let base = self.repo_path(repo)?;
        self.core.check_paging(query.page, query.per_page)?;
        let path = path_with_query(
            &format!("{base}/releases"),
            &Self::paging(query.page, query.per_page),
        );

        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::releases(PLATFORM, repo)],
                query.force_refresh,
                move || async move {
                    let raw: Vec<GitHubRelease> = api.get_json(&path).await?;
                    Ok(raw.into_iter().map(convert::release).collect())
                },
            )
            .await
    }

    fn invalidate(&self, tags: &[String]) -> usize {
        self.core.invalidate(tags)
    }

    fn clear_cache(&self) {
        self.core.clear_cache();
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        self.core.cache_stats()
    }

    fn shutdown(&self) {
        self.core.shutdown();
    }
}
