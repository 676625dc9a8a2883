//! GitLab API data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// GitLab project - fields we need from the API response.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabProject {
    /// Project ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Project path (slug).
    pub path: String,
    /// Full path including namespace (e.g., "group/subgroup/project").
    pub path_with_namespace: String,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    /// "public", "private" or "internal". Absent for anonymous listings.
    pub visibility: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Pre-14.0 name of `topics`.
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub star_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    /// Null when issues are disabled.
    pub open_issues_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub namespace: GitLabNamespace,
    /// If this is a fork, info about the source project.
    pub forked_from_project: Option<ForkedFrom>,
    pub web_url: String,
    pub ssh_url_to_repo: Option<String>,
    pub http_url_to_repo: Option<String>,
}

/// GitLab namespace (group or user).
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabNamespace {
    pub id: u64,
    pub name: String,
    pub path: String,
    /// Full path (e.g., "group/subgroup").
    pub full_path: String,
    /// Kind: "group" or "user".
    pub kind: String,
    pub avatar_url: Option<String>,
    pub web_url: Option<String>,
}

/// Minimal fork source information.
#[derive(Debug, Clone, Deserialize)]
pub struct ForkedFrom {
    pub id: u64,
}

/// User summary embedded in issues, merge requests and releases.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabUserBasic {
    pub id: u64,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub web_url: Option<String>,
}

/// Full user as returned by `GET /users?username=`.
///
/// Profile fields beyond the basics are only populated for some callers
/// (admins, or the user themselves), hence all the options.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabUser {
    pub id: u64,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub web_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub public_email: Option<String>,
    #[serde(default)]
    pub bot: bool,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabMilestone {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    /// "active" or "closed".
    pub state: String,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabIssue {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    /// "opened" or "closed".
    pub state: String,
    /// Label names (the default `with_labels_details=false` shape).
    #[serde(default)]
    pub labels: Vec<String>,
    pub author: Option<GitLabUserBasic>,
    #[serde(default)]
    pub assignees: Vec<GitLabUserBasic>,
    pub milestone: Option<GitLabMilestone>,
    #[serde(default)]
    pub user_notes_count: u64,
    pub web_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabMergeRequest {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    /// "opened", "closed", "merged" or "locked".
    pub state: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub author: Option<GitLabUserBasic>,
    #[serde(default)]
    pub assignees: Vec<GitLabUserBasic>,
    pub milestone: Option<GitLabMilestone>,
    pub web_url: String,
    pub source_branch: String,
    pub target_branch: String,
    pub sha: Option<String>,
    #[serde(default)]
    pub draft: bool,
    /// Pre-15.0 name of `draft`.
    #[serde(default)]
    pub work_in_progress: bool,
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabCommit {
    /// Full SHA.
    pub id: String,
    pub message: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub authored_date: Option<DateTime<Utc>>,
    pub committed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitLabReleaseLinks {
    #[serde(rename = "self")]
    pub self_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabRelease {
    pub tag_name: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    /// Set when `released_at` lies in the future.
    #[serde(default)]
    pub upcoming_release: bool,
    pub author: Option<GitLabUserBasic>,
    #[serde(rename = "_links", default)]
    pub links: GitLabReleaseLinks,
}

/// Body of `POST /projects/:id/issues`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueBody<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    /// Comma-separated label names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

/// Body of `PUT /projects/:id/issues/:iid`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateIssueBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    /// "close" or "reopen".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}
