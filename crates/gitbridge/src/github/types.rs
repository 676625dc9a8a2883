//! GitHub REST API payloads.
//!
//! Only the fields the domain model needs are declared; serde ignores the
//! rest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account summary embedded in most payloads (`owner`, `user`, `assignees`).
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAccount {
    pub id: u64,
    pub login: String,
    /// "User", "Organization" or "Bot".
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: GitHubAccount,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub private: bool,
    /// "public", "private" or "internal" (enterprise). Older payloads omit it.
    pub visibility: Option<String>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubLabel {
    pub id: Option<u64>,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubMilestone {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    pub due_on: Option<DateTime<Utc>>,
}

/// An item from the issues API, which also returns pull requests.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub user: Option<GitHubAccount>,
    #[serde(default)]
    pub assignees: Vec<GitHubAccount>,
    pub milestone: Option<GitHubMilestone>,
    #[serde(default)]
    pub comments: u64,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Present only when the item is really a pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl GitHubIssue {
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Head or base of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubBranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubPullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub user: Option<GitHubAccount>,
    #[serde(default)]
    pub assignees: Vec<GitHubAccount>,
    pub milestone: Option<GitHubMilestone>,
    pub html_url: String,
    pub head: GitHubBranchRef,
    pub base: GitHubBranchRef,
    #[serde(default)]
    pub draft: bool,
    /// Only sent by the single pull request endpoint.
    pub merged: Option<bool>,
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Full profile from `GET /users/{login}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub public_repos: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubGitActor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitDetail {
    pub message: String,
    pub author: Option<GitHubGitActor>,
    pub committer: Option<GitHubGitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitParent {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub commit: GitHubCommitDetail,
    /// The GitHub account matched to the author email, if any.
    pub author: Option<GitHubAccount>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub parents: Vec<GitHubCommitParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<GitHubAccount>,
    pub html_url: Option<String>,
}

/// Envelope of the search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSearchResponse<T> {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<T>,
}

/// Response from the `/rate_limit` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimitResponse {
    pub resources: GitHubRateLimits,
}

/// Rate limits for different API resources.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimits {
    pub core: RateLimitResource,
    pub search: Option<RateLimitResource>,
}

/// Individual rate limit resource.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResource {
    pub limit: u64,
    pub remaining: u64,
    /// Epoch seconds.
    pub reset: i64,
    #[serde(default)]
    pub used: u64,
}

fn is_empty_slice(values: &&[String]) -> bool {
    values.is_empty()
}

/// Body of `POST /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueBody<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub labels: &'a [String],
    #[serde(skip_serializing_if = "is_empty_slice")]
    pub assignees: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Body of `PATCH /repos/{owner}/{repo}/issues/{number}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateIssueBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}
