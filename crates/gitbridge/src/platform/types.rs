use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::repo_id::RepoId;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitHub,
    GitLab,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::GitHub => "github",
            Platform::GitLab => "gitlab",
        }
    }

    /// Parse a platform name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "github" | "gh" => Some(Platform::GitHub),
            "gitlab" | "gl" => Some(Platform::GitLab),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository visibility levels (normalized across platforms).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    /// GitLab-specific: visible to logged-in users within the instance.
    Internal,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
            Visibility::Internal => write!(f, "internal"),
        }
    }
}

/// What kind of account a login belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    User,
    Organization,
    Bot,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::User => write!(f, "user"),
            UserType::Organization => write!(f, "organization"),
            UserType::Bot => write!(f, "bot"),
        }
    }
}

/// A compact account reference embedded in other entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub login: String,
    pub kind: UserType,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

/// The account (user, organization or group) that owns a repository.
pub type RepositoryOwner = Account;

/// A repository from any platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub platform: Platform,
    /// Provider-global identifier.
    pub id: u64,
    /// Namespace path (user, org, or nested GitLab group).
    pub owner: String,
    pub name: String,
    /// Always `owner/name`.
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub visibility: Visibility,
    pub default_branch: Option<String>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub owner_account: RepositoryOwner,
}

impl Repository {
    /// The identifier this repository can be addressed by.
    #[must_use]
    pub fn repo_id(&self) -> RepoId {
        RepoId::new(&self.owner, &self.name).on(self.platform)
    }
}

/// A full user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub platform: Platform,
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub kind: UserType,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub public_repos: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: Option<u64>,
    pub name: String,
    /// Hex color without the leading `#`.
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u64,
    /// Per-repository sequence number (GitHub `number`, GitLab `iid`).
    pub number: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: IssueState,
    pub due_on: Option<NaiveDate>,
}

/// Issue lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

/// Pull/merge request lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl std::fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullRequestState::Open => write!(f, "open"),
            PullRequestState::Closed => write!(f, "closed"),
            PullRequestState::Merged => write!(f, "merged"),
        }
    }
}

/// An issue. Pull/merge requests are never represented as issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Provider-global identifier.
    pub id: u64,
    /// Per-repository number shown to humans.
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    pub labels: Vec<Label>,
    pub author: Option<Account>,
    pub assignees: Vec<Account>,
    pub milestone: Option<Milestone>,
    pub comments: u64,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repository: RepoId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Provider-global identifier.
    pub id: u64,
    /// Per-repository number shown to humans.
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: PullRequestState,
    pub labels: Vec<Label>,
    pub author: Option<Account>,
    pub assignees: Vec<Account>,
    pub milestone: Option<Milestone>,
    pub html_url: String,
    pub head_branch: String,
    pub base_branch: String,
    pub head_sha: Option<String>,
    pub draft: bool,
    pub merged: bool,
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repository: RepoId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub committed_at: Option<DateTime<Utc>>,
    /// Linked account, when the provider could match the author email.
    pub author: Option<Account>,
    pub html_url: Option<String>,
    pub parents: Vec<String>,
}

impl Commit {
    /// First line of the commit message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Provider identifier. GitLab releases have none, so this is 0 there.
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<Account>,
    pub html_url: Option<String>,
}

/// Rate limit snapshot from a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Maximum requests allowed per period.
    pub limit: u64,
    /// Remaining requests in current period.
    pub remaining: u64,
    /// When the rate limit resets.
    pub reset_at: DateTime<Utc>,
    /// Which quota this describes (e.g. `core`, `search`).
    pub resource: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub page: u32,
    pub per_page: u32,
}

/// Optional features that differ between providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The provider exposes a rate-limit status endpoint. Without one,
    /// `get_rate_limit` reports the last response headers seen.
    pub rate_limit_endpoint: bool,
    /// Listing requests can filter on `merged` server side.
    pub merged_state_filter: bool,
    /// Repository owners can be nested groups (`group/subgroup`).
    pub nested_namespaces: bool,
    /// Pull request listings can filter by label, assignee and author.
    pub pull_request_filters: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_display_and_parse() {
        assert_eq!(Platform::GitHub.to_string(), "github");
        assert_eq!(Platform::GitLab.to_string(), "gitlab");
        assert_eq!(Platform::from_name("GitHub"), Some(Platform::GitHub));
        assert_eq!(Platform::from_name("gl"), Some(Platform::GitLab));
        assert_eq!(Platform::from_name("gitea"), None);
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&Platform::GitLab).expect("serialize"),
            "\"gitlab\""
        );
        assert_eq!(
            serde_json::to_string(&PullRequestState::Merged).expect("serialize"),
            "\"merged\""
        );
        assert_eq!(
            serde_json::to_string(&UserType::Organization).expect("serialize"),
            "\"organization\""
        );
    }

    #[test]
    fn display_outputs_expected_strings() {
        assert_eq!(Visibility::Internal.to_string(), "internal");
        assert_eq!(IssueState::Open.to_string(), "open");
        assert_eq!(PullRequestState::Closed.to_string(), "closed");
        assert_eq!(UserType::Bot.to_string(), "bot");
    }

    #[test]
    fn commit_summary_is_first_line() {
        let commit = Commit {
            sha: "abc".into(),
            message: "Fix parser\n\nLonger body".into(),
            author_name: None,
            author_email: None,
            authored_at: None,
            committed_at: None,
            author: None,
            html_url: None,
            parents: Vec::new(),
        };
        assert_eq!(commit.summary(), "Fix parser");
    }
}
