//! Cache tag names.
//!
//! Reads label their cache entries with these tags; writes and
//! [`PlatformClient::invalidate`](super::PlatformClient::invalidate) clear by
//! them. Every tag is scoped by platform so two clients never collide.

use super::query::StateFilter;
use super::repo_id::RepoId;
use super::types::Platform;

/// A single repository's metadata.
#[must_use]
pub fn repo(platform: Platform, repo: &RepoId) -> String {
    format!("repo:{platform}:{}", repo.full_name())
}

/// Every issue listing of a repository, whatever the filter.
#[must_use]
pub fn issues(platform: Platform, repo: &RepoId) -> String {
    format!("issues:{platform}:{}", repo.full_name())
}

/// Issue listings of a repository for one state filter.
#[must_use]
pub fn issues_in_state(platform: Platform, repo: &RepoId, state: StateFilter) -> String {
    format!("issues:{platform}:{}:{state}", repo.full_name())
}

/// A single issue.
#[must_use]
pub fn issue(platform: Platform, repo: &RepoId, number: u64) -> String {
    format!("issue:{platform}:{}#{number}", repo.full_name())
}

/// Every pull/merge request listing of a repository.
#[must_use]
pub fn pulls(platform: Platform, repo: &RepoId) -> String {
    format!("pulls:{platform}:{}", repo.full_name())
}

/// A single pull/merge request.
#[must_use]
pub fn pull(platform: Platform, repo: &RepoId, number: u64) -> String {
    format!("pr:{platform}:{}#{number}", repo.full_name())
}

#[must_use]
pub fn user(platform: Platform, login: &str) -> String {
    format!("user:{platform}:{}", login.to_ascii_lowercase())
}

#[must_use]
pub fn search(platform: Platform) -> String {
    format!("search:{platform}")
}

#[must_use]
pub fn commits(platform: Platform, repo: &RepoId) -> String {
    format!("commits:{platform}:{}", repo.full_name())
}

#[must_use]
pub fn releases(platform: Platform, repo: &RepoId) -> String {
    format!("releases:{platform}:{}", repo.full_name())
}
