//! Model conversion from GitHub API types to the domain model.

use chrono::DateTime;

use crate::error::{GitPlatformError, Result};
use crate::platform::{
    Account, Commit, Issue, IssueState, Label, Milestone, Platform, PullRequest, PullRequestState,
    RateLimitInfo, Release, RepoId, Repository, User, UserType, Visibility,
};

use super::types::{
    GitHubAccount, GitHubCommit, GitHubIssue, GitHubLabel, GitHubMilestone, GitHubPullRequest,
    GitHubRelease, GitHubRepository, GitHubUser, RateLimitResource,
};

fn user_type(account_type: Option<&str>) -> UserType {
    match account_type {
        Some("Organization") => UserType::Organization,
        Some("Bot") => UserType::Bot,
        _ => UserType::User,
    }
}

/// Determine visibility from a GitHub repository.
///
/// GitHub can return "public", "private", or "internal" (GitHub Enterprise
/// only). Payloads without `visibility` fall back to the `private` flag.
fn visibility(repo: &GitHubRepository) -> Visibility {
    match repo.visibility.as_deref() {
        Some("internal") => Visibility::Internal,
        Some("private") => Visibility::Private,
        Some(_) => Visibility::Public,
        None if repo.private => Visibility::Private,
        None => Visibility::Public,
    }
}

fn issue_state(state: &str) -> IssueState {
    if state.eq_ignore_ascii_case("closed") {
        IssueState::Closed
    } else {
        IssueState::Open
    }
}

pub fn account(raw: &GitHubAccount) -> Account {
    Account {
        id: raw.id,
        login: raw.login.clone(),
        kind: user_type(raw.account_type.as_deref()),
        avatar_url: raw.avatar_url.clone(),
        html_url: raw.html_url.clone(),
    }
}

pub fn label(raw: GitHubLabel) -> Label {
    Label {
        id: raw.id,
        name: raw.name,
        color: raw.color,
        description: raw.description,
    }
}

pub fn milestone(raw: GitHubMilestone) -> Milestone {
    Milestone {
        id: raw.id,
        number: raw.number,
        title: raw.title,
        description: raw.description,
        state: issue_state(&raw.state),
        due_on: raw.due_on.map(|due| due.date_naive()),
    }
}

pub fn repository(raw: GitHubRepository) -> Repository {
    let visibility = visibility(&raw);
    let owner = raw.owner.login.clone();
    Repository {
        platform: Platform::GitHub,
        id: raw.id,
        full_name: format!("{owner}/{}", raw.name),
        owner,
        name: raw.name,
        description: raw.description,
        html_url: raw.html_url,
        clone_url: raw.clone_url,
        ssh_url: raw.ssh_url,
        visibility,
        default_branch: raw.default_branch,
        is_fork: raw.fork,
        is_archived: raw.archived,
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        open_issues: raw.open_issues_count,
        language: raw.language,
        topics: raw.topics,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        pushed_at: raw.pushed_at,
        owner_account: account(&raw.owner),
    }
}

/// Convert an issue. Callers must filter out pull requests first.
pub fn issue(raw: GitHubIssue, repo: &RepoId) -> Issue {
    Issue {
        id: raw.id,
        number: raw.number,
        title: raw.title,
        body: raw.body,
        state: issue_state(&raw.state),
        labels: raw.labels.into_iter().map(label).collect(),
        author: raw.user.as_ref().map(account),
        assignees: raw.assignees.iter().map(account).collect(),
        milestone: raw.milestone.map(milestone),
        comments: raw.comments,
        html_url: raw.html_url,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
        repository: repo.clone().on(Platform::GitHub),
    }
}

/// Convert a pull request.
///
/// The list endpoint only reports `open`/`closed`; a set `merged` flag or
/// `merged_at` timestamp makes it `merged`.
pub fn pull_request(raw: GitHubPullRequest, repo: &RepoId) -> PullRequest {
    let merged = raw.merged.unwrap_or(false) || raw.merged_at.is_some();
    let state = if merged {
        PullRequestState::Merged
    } else if raw.state.eq_ignore_ascii_case("closed") {
        PullRequestState::Closed
    } else {
        PullRequestState::Open
    };

    PullRequest {
        id: raw.id,
        number: raw.number,
        title: raw.title,
        body: raw.body,
        state,
        labels: raw.labels.into_iter().map(label).collect(),
        author: raw.user.as_ref().map(account),
        assignees: raw.assignees.iter().map(account).collect(),
        milestone: raw.milestone.map(milestone),
        html_url: raw.html_url,
        head_branch: raw.head.ref_name,
        base_branch: raw.base.ref_name,
        head_sha: raw.head.sha,
        draft: raw.draft,
        merged,
        merged_at: raw.merged_at,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
        repository: repo.clone().on(Platform::GitHub),
    }
}

pub fn user(raw: GitHubUser) -> User {
    User {
        platform: Platform::GitHub,
        id: raw.id,
        kind: user_type(raw.account_type.as_deref()),
        login: raw.login,
        name: raw.name,
        email: raw.email,
        avatar_url: raw.avatar_url,
        html_url: raw.html_url,
        bio: raw.bio,
        company: raw.company,
        location: raw.location,
        followers: raw.followers,
        following: raw.following,
        public_repos: raw.public_repos,
        created_at: raw.created_at,
    }
}

pub fn commit(raw: GitHubCommit) -> Commit {
    let author = raw.commit.author;
    let committed_at = raw.commit.committer.and_then(|c| c.date);
    Commit {
        sha: raw.sha,
        message: raw.commit.message,
        author_name: author.as_ref().and_then(|a| a.name.clone()),
        author_email: author.as_ref().and_then(|a| a.email.clone()),
        authored_at: author.and_then(|a| a.date),
        committed_at,
        author: raw.author.as_ref().map(account),
        html_url: raw.html_url,
        parents: raw.parents.into_iter().map(|p| p.sha).collect(),
    }
}

pub fn release(raw: GitHubRelease) -> Release {
    Release {
        id: raw.id,
        tag_name: raw.tag_name,
        name: raw.name,
        body: raw.body,
        draft: raw.draft,
        prerelease: raw.prerelease,
        created_at: raw.created_at,
        published_at: raw.published_at,
        author: raw.author.as_ref().map(account),
        html_url: raw.html_url,
    }
}

/// Convert one resource of the `/rate_limit` response.
pub fn rate_limit(raw: &RateLimitResource, resource: &str) -> Result<RateLimitInfo> {
    let reset_at = DateTime::from_timestamp(raw.reset, 0).ok_or_else(|| {
        GitPlatformError::decode(
            Platform::GitHub,
            format!("rate limit reset {} is out of range", raw.reset),
        )
    })?;
    Ok(RateLimitInfo {
        limit: raw.limit,
        remaining: raw.remaining,
        reset_at,
        resource: resource.to_string(),
    })
}
