//! GitLab client implementing [`PlatformClient`].

use std::sync::Arc;

use async_trait::async_trait;

use super::convert;
use super::types::{
    CreateIssueBody, GitLabCommit, GitLabIssue, GitLabMergeRequest, GitLabProject, GitLabRelease,
    GitLabUser, UpdateIssueBody,
};
use crate::cache::CacheStats;
use crate::config::ClientConfig;
use crate::error::{GitPlatformError, Result};
use crate::http::{HttpMethod, HttpTransport, ReqwestTransport};
use crate::platform::{
    Capabilities, ClientCore, Commit, CommitQuery, Issue, IssueRef, IssueState, IssueUpdate,
    ListQuery, NewIssue, PageQuery, Platform, PlatformClient, PullRequest, RateLimitInfo, Release,
    RepoId, Repository, SearchQuery, SearchResults, SearchSort, SortOrder, StateFilter, User, tags,
};
use crate::transport::path_with_query;

const PLATFORM: Platform = Platform::GitLab;

/// GitLab REST API (v4) client.
///
/// Works against gitlab.com and self-managed instances; point
/// [`ClientConfig::base_url`] at `https://<host>/api/v4`.
#[derive(Debug)]
pub struct GitLabClient {
    core: ClientCore,
}

/// URL-encode a project path for use as `:id`.
fn encode_project(full_name: &str) -> String {
    url::form_urlencoded::byte_serialize(full_name.as_bytes()).collect()
}

fn gitlab_state(state: StateFilter) -> Option<&'static str> {
    match state {
        StateFilter::Open => Some("opened"),
        StateFilter::Closed => Some("closed"),
        StateFilter::Merged => Some("merged"),
        StateFilter::All => None,
    }
}

fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(state) = gitlab_state(query.state) {
        params.push(("state", state.to_string()));
    }
    if !query.labels.is_empty() {
        params.push(("labels", query.labels.join(",")));
    }
    if let Some(assignee) = &query.assignee {
        params.push(("assignee_username", assignee.clone()));
    }
    if let Some(author) = &query.author {
        params.push(("author_username", author.clone()));
    }
    params.push(("page", query.page.to_string()));
    params.push(("per_page", query.per_page.to_string()));
    params
}

impl GitLabClient {
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

    #[must_use]
    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    /// `/projects/{url-encoded path}` after validating the identifier.
    fn project_path(&self, repo: &RepoId) -> Result<String> {
        self.core.check_repo(repo)?;
        Ok(format!("/projects/{}", encode_project(&repo.full_name())))
    }

    /// Resolve logins to user ids, which is what GitLab writes expect.
    async fn user_ids(&self, logins: &[String]) -> Result<Vec<u64>> {
        let mut ids = Vec::with_capacity(logins.len());
        for login in logins {
            ids.push(self.get_user(login).await?.id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl PlatformClient for GitLabClient {
    fn platform(&self) -> Platform {
        PLATFORM
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            rate_limit_endpoint: false,
            merged_state_filter: true,
            nested_namespaces: true,
            pull_request_filters: true,
        }
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn get_repository(&self, repo: &RepoId) -> Result<Repository> {
        let path = self.project_path(repo)?;
        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::repo(PLATFORM, repo)],
                false,
                move || async move {
                    let raw: GitLabProject = api.get_json(&path).await?;
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

        let mut params = vec![("search", query.query.clone())];
        // GitLab cannot order projects by fork count; that page is sorted locally.
        match query.sort {
            Some(SearchSort::Stars) => params.push(("order_by", "star_count".to_string())),
            Some(SearchSort::Updated) => params.push(("order_by", "last_activity_at".to_string())),
            Some(SearchSort::Forks) | None => {}
        }
        if matches!(query.sort, Some(SearchSort::Stars | SearchSort::Updated)) {
            params.push(("sort", query.order.as_str().to_string()));
        }
        params.push(("page", query.page.to_string()));
        params.push(("per_page", query.per_page.to_string()));
        let path = path_with_query("/projects", &params);

        let api = self.core.transport();
        let (page, per_page, sort, order) = (query.page, query.per_page, query.sort, query.order);
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::search(PLATFORM)],
                query.force_refresh,
                move || async move {
                    let response = api.get(&path).await?;
                    let info = response.page_info();
                    let raw: Vec<GitLabProject> = response.json()?;
                    let mut items: Vec<Repository> =
                        raw.into_iter().map(convert::repository).collect();
                    if sort == Some(SearchSort::Forks) {
                        items.sort_by_key(|repo| repo.forks);
                        if order == SortOrder::Desc {
                            items.reverse();
                        }
                    }
                    Ok(SearchResults {
                        total_count: info.total_count.unwrap_or(items.len() as u64),
                        items,
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
        let base = self.project_path(repo)?;
        self.core.check_paging(query.page, query.per_page)?;
        if query.state == StateFilter::Merged {
            return Err(GitPlatformError::validation(
                PLATFORM,
                "the merged state only applies to merge requests",
            ));
        }
        let path = path_with_query(&format!("{base}/issues"), &list_params(query));

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
                    let raw: Vec<GitLabIssue> = api.get_json(&path).await?;
                    Ok(raw
                        .into_iter()
                        .map(|item| convert::issue(item, &repo_id))
                        .collect())
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(issue = %issue))]
    async fn get_issue(&self, issue: &IssueRef) -> Result<Issue> {
        let path = format!("{}/issues/{}", self.project_path(&issue.repo)?, issue.number);
        let api = self.core.transport();
        let repo_id = issue.repo.clone();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::issue(PLATFORM, &issue.repo, issue.number)],
                false,
                move || async move {
                    let raw: GitLabIssue = api.get_json(&path).await?;
                    Ok(convert::issue(raw, &repo_id))
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
        let base = self.project_path(repo)?;
        self.core.check_paging(query.page, query.per_page)?;
        let path = path_with_query(&format!("{base}/merge_requests"), &list_params(query));

        let api = self.core.transport();
        let repo_id = repo.clone();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::pulls(PLATFORM, repo)],
                query.force_refresh,
                move || async move {
                    let raw: Vec<GitLabMergeRequest> = api.get_json(&path).await?;
                    Ok(raw
                        .into_iter()
                        .map(|mr| convert::pull_request(mr, &repo_id))
                        .collect())
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(pr = %pr))]
    async fn get_pull_request(&self, pr: &IssueRef) -> Result<PullRequest> {
        let path = format!(
            "{}/merge_requests/{}",
            self.project_path(&pr.repo)?,
            pr.number
        );
        let api = self.core.transport();
        let repo_id = pr.repo.clone();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::pull(PLATFORM, &pr.repo, pr.number)],
                false,
                move || async move {
                    let raw: GitLabMergeRequest = api.get_json(&path).await?;
                    Ok(convert::pull_request(raw, &repo_id))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(username = %username))]
    async fn get_user(&self, username: &str) -> Result<User> {
        let login = username.trim();
        if login.is_empty() {
            return Err(GitPlatformError::validation(PLATFORM, "empty username"));
        }
        let path = path_with_query("/users", &[("username", login.to_string())]);
        let api = self.core.transport();
        let wanted = login.to_string();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::user(PLATFORM, login)],
                false,
                move || async move {
                    let raw: Vec<GitLabUser> = api.get_json(&path).await?;
                    raw.into_iter()
                        .next()
                        .map(convert::user)
                        .ok_or_else(|| {
                            GitPlatformError::not_found(PLATFORM, format!("user {wanted}"))
                        })
                },
            )
            .await
    }

    /// GitLab has no rate limit endpoint. This reports the headers of the
    /// last response, fetching `/user` first if nothing has been seen yet.
    #[tracing::instrument(skip_all)]
    async fn get_rate_limit(&self) -> Result<RateLimitInfo> {
        let api = self.core.transport();
        if let Some(info) = api.last_rate_limit() {
            return Ok(info);
        }
        self.core
            .uncached(move || async move {
                api.get("/user").await?.rate_limit.ok_or_else(|| {
                    GitPlatformError::not_found(PLATFORM, "rate limit headers")
                })
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn create_issue(&self, repo: &RepoId, issue: &NewIssue) -> Result<Issue> {
        let path = format!("{}/issues", self.project_path(repo)?);
        if issue.title.trim().is_empty() {
            return Err(GitPlatformError::validation(PLATFORM, "issue title is empty"));
        }
        let body = CreateIssueBody {
            title: &issue.title,
            description: issue.body.as_deref(),
            labels: (!issue.labels.is_empty()).then(|| issue.labels.join(",")),
            assignee_ids: self.user_ids(&issue.assignees).await?,
            milestone_id: issue.milestone,
        };

        let api = self.core.transport();
        self.core
            .write(vec![tags::issues(PLATFORM, repo)], move || async move {
                let raw: GitLabIssue = api
                    .send_json(HttpMethod::Post, &path, &body)
                    .await?
                    .json()?;
                Ok(convert::issue(raw, repo))
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(issue = %issue))]
    async fn update_issue(&self, issue: &IssueRef, update: &IssueUpdate) -> Result<Issue> {
        let path = format!("{}/issues/{}", self.project_path(&issue.repo)?, issue.number);
        if update.is_empty() {
            return Err(GitPlatformError::validation(PLATFORM, "nothing to update"));
        }
        let assignee_ids = match &update.assignees {
            Some(logins) => Some(self.user_ids(logins).await?),
            None => None,
        };
        let body = UpdateIssueBody {
            title: update.title.as_deref(),
            description: update.body.as_deref(),
            state_event: update.state.map(|state| match state {
                IssueState::Open => "reopen",
                IssueState::Closed => "close",
            }),
            labels: update.labels.as_ref().map(|labels| labels.join(",")),
            assignee_ids,
            milestone_id: update.milestone,
        };

        let api = self.core.transport();
        self.core
            .write(
                vec![
                    tags::issues(PLATFORM, &issue.repo),
                    tags::issue(PLATFORM, &issue.repo, issue.number),
                ],
                move || async move {
                    let raw: GitLabIssue = api
                        .send_json(HttpMethod::Put, &path, &body)
                        .await?
                        .json()?;
                    Ok(convert::issue(raw, &issue.repo))
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn list_commits(&self, repo: &RepoId, query: &CommitQuery) -> Result<Vec<Commit>> {
        let base = self.project_path(repo)?;
        self.core
            .check_paging(query.paging.page, query.paging.per_page)?;

        let mut params = Vec::new();
        if let Some(ref_name) = &query.ref_name {
            params.push(("ref_name", ref_name.clone()));
        }
        if let Some(file) = &query.path {
            params.push(("path", file.clone()));
        }
        params.push(("page", query.paging.page.to_string()));
        params.push(("per_page", query.paging.per_page.to_string()));
        let path = path_with_query(&format!("{base}/repository/commits"), &params);

        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::commits(PLATFORM, repo)],
                query.paging.force_refresh,
                move || async move {
                    let raw: Vec<GitLabCommit> = api.get_json(&path).await?;
                    Ok(raw.into_iter().map(convert::commit).collect())
                },
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(repo = %repo))]
    async fn list_releases(&self, repo: &RepoId, query: &PageQuery) -> Result<Vec<Release>> {
        let base = self.project_path(repo)?;
        self.core.check_paging(query.page, query.per_page)?;
        let path = path_with_query(
            &format!("{base}/releases"),
            &[
                ("page", query.page.to_string()),
                ("per_page", query.per_page.to_string()),
            ],
        );

        let api = self.core.transport();
        self.core
            .cached(
                self.core.cache_key(&path),
                vec![tags::releases(PLATFORM, repo)],
                query.force_refresh,
                move || async move {
                    let raw: Vec<GitLabRelease> = api.get_json(&path).await?;
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
