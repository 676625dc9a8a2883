//! Model conversion from GitLab API types to the domain model.
//!
//! GitLab names things differently: `iid` is the per-project number,
//! `opened` is open, and labels arrive as plain names.

use crate::platform::{
    Account, Commit, Issue, IssueState, Label, Milestone, Platform, PullRequest, PullRequestState,
    Release, RepoId, Repository, User, UserType, Visibility,
};

use super::types::{
    GitLabCommit, GitLabIssue, GitLabMergeRequest, GitLabMilestone, GitLabNamespace,
    GitLabProject, GitLabRelease, GitLabUser, GitLabUserBasic,
};

/// Determine visibility from a GitLab project.
fn visibility(project: &GitLabProject) -> Visibility {
    match project.visibility.as_deref() {
        Some("private") => Visibility::Private,
        Some("internal") => Visibility::Internal,
        _ => Visibility::Public,
    }
}

/// `opened`/`closed` to the neutral issue state.
pub fn issue_state(state: &str) -> IssueState {
    if state.eq_ignore_ascii_case("closed") {
        IssueState::Closed
    } else {
        IssueState::Open
    }
}

/// Merge request state. `merged_at` wins over whatever `state` says.
pub fn merge_request_state(state: &str, merged: bool) -> PullRequestState {
    if merged || state.eq_ignore_ascii_case("merged") {
        PullRequestState::Merged
    } else if state.eq_ignore_ascii_case("closed") {
        PullRequestState::Closed
    } else {
        // "opened" and "locked"
        PullRequestState::Open
    }
}

fn namespace_account(ns: &GitLabNamespace) -> Account {
    Account {
        id: ns.id,
        login: ns.full_path.clone(),
        kind: if ns.kind == "group" {
            UserType::Organization
        } else {
            UserType::User
        },
        avatar_url: ns.avatar_url.clone(),
        html_url: ns.web_url.clone(),
    }
}

pub fn account(user: &GitLabUserBasic) -> Account {
    Account {
        id: user.id,
        login: user.username.clone(),
        kind: UserType::User,
        avatar_url: user.avatar_url.clone(),
        html_url: user.web_url.clone(),
    }
}

fn label(name: String) -> Label {
    Label {
        id: None,
        name,
        color: None,
        description: None,
    }
}

pub fn milestone(raw: GitLabMilestone) -> Milestone {
    Milestone {
        id: raw.id,
        number: raw.iid,
        title: raw.title,
        description: raw.description,
        state: issue_state(&raw.state),
        due_on: raw.due_date,
    }
}

/// Convert a project. `owner` is the namespace part of `path_with_namespace`
/// and `name` the project path, so `full_name` matches what GitLab accepts
/// as an identifier.
pub fn repository(project: GitLabProject) -> Repository {
    let visibility = visibility(&project);
    let owner = project
        .path_with_namespace
        .rsplit_once('/')
        .map(|(ns, _)| ns.to_string())
        .unwrap_or_else(|| project.namespace.full_path.clone());
    let topics = if project.topics.is_empty() {
        project.tag_list
    } else {
        project.topics
    };

    Repository {
        platform: Platform::GitLab,
        id: project.id,
        full_name: format!("{owner}/{}", project.path),
        owner_account: namespace_account(&project.namespace),
        owner,
        name: project.path,
        description: project.description,
        html_url: project.web_url,
        clone_url: project.http_url_to_repo,
        ssh_url: project.ssh_url_to_repo,
        visibility,
        default_branch: project.default_branch,
        is_fork: project.forked_from_project.is_some(),
        is_archived: project.archived,
        stars: project.star_count,
        forks: project.forks_count,
        open_issues: project.open_issues_count.unwrap_or(0),
        language: None, // not part of the project payload
        topics,
        created_at: project.created_at,
        updated_at: project.last_activity_at,
        pushed_at: None,
    }
}

pub fn issue(raw: GitLabIssue, repo: &RepoId) -> Issue {
    Issue {
        id: raw.id,
        number: raw.iid,
        title: raw.title,
        body: raw.description,
        state: issue_state(&raw.state),
        labels: raw.labels.into_iter().map(label).collect(),
        author: raw.author.as_ref().map(account),
        assignees: raw.assignees.iter().map(account).collect(),
        milestone: raw.milestone.map(milestone),
        comments: raw.user_notes_count,
        html_url: raw.web_url,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
        repository: repo.clone().on(Platform::GitLab),
    }
}

pub fn pull_request(raw: GitLabMergeRequest, repo: &RepoId) -> PullRequest {
    let state = merge_request_state(&raw.state, raw.merged_at.is_some());
    PullRequest {
        id: raw.id,
        number: raw.iid,
        title: raw.title,
        body: raw.description,
        state,
        labels: raw.labels.into_iter().map(label).collect(),
        author: raw.author.as_ref().map(account),
        assignees: raw.assignees.iter().map(account).collect(),
        milestone: raw.milestone.map(milestone),
        html_url: raw.web_url,
        head_branch: raw.source_branch,
        base_branch: raw.target_branch,
        head_sha: raw.sha,
        draft: raw.draft || raw.work_in_progress,
        merged: state == PullRequestState::Merged,
        merged_at: raw.merged_at,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
        repository: repo.clone().on(Platform::GitLab),
    }
}

pub fn user(raw: GitLabUser) -> User {
    User {
        platform: Platform::GitLab,
        id: raw.id,
        login: raw.username,
        name: raw.name,
        email: raw.public_email.filter(|email| !email.is_empty()),
        avatar_url: raw.avatar_url,
        html_url: raw.web_url,
        bio: raw.bio.filter(|bio| !bio.is_empty()),
        company: raw.organization.filter(|org| !org.is_empty()),
        location: raw.location.filter(|loc| !loc.is_empty()),
        kind: if raw.bot { UserType::Bot } else { UserType::User },
        followers: raw.followers,
        following: raw.following,
        public_repos: None,
        created_at: raw.created_at,
    }
}

pub fn commit(raw: GitLabCommit) -> Commit {
    Commit {
        sha: raw.id,
        message: raw.message,
        author_name: raw.author_name,
        author_email: raw.author_email,
        authored_at: raw.authored_date,
        committed_at: raw.committed_date,
        author: None,
        html_url: raw.web_url,
        parents: raw.parent_ids,
    }
}

/// GitLab releases have no numeric id and no draft state.
pub fn release(raw: GitLabRelease) -> Release {
    Release {
        id: 0,
        tag_name: raw.tag_name,
        name: raw.name,
        body: raw.description,
        draft: false,
        prerelease: raw.upcoming_release,
        created_at: raw.created_at,
        published_at: raw.released_at,
        author: raw.author.as_ref().map(account),
        html_url: raw.links.self_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mr_json(state: &str, merged_at: Option<&str>) -> String {
        let merged_at = merged_at.map_or("null".to_string(), |t| format!("\"{t}\""));
        format!(
            r#"{{
                "id": 501, "iid": 12, "title": "Add feature", "description": "body",
                "state": "{state}", "labels": ["backend"],
                "author": {{"id": 3, "username": "jdoe"}},
                "web_url": "https://gitlab.com/g/p/-/merge_requests/12",
                "source_branch": "feature", "target_branch": "main",
                "merged_at": {merged_at},
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z",
                "closed_at": null
            }}"#
        )
    }

    #[test]
    fn merge_request_states_normalize() {
        let repo = RepoId::new("g", "p");

        let raw: GitLabMergeRequest = serde_json::from_str(&mr_json("opened", None)).expect("json");
        let pr = pull_request(raw, &repo);
        assert_eq!(pr.state, PullRequestState::Open);
        assert!(!pr.merged);
        assert_eq!(pr.id, 501);
        assert_eq!(pr.number, 12);

        let raw: GitLabMergeRequest =
            serde_json::from_str(&mr_json("merged", Some("2024-01-02T00:00:00Z"))).expect("json");
        let pr = pull_request(raw, &repo);
        assert_eq!(pr.state, PullRequestState::Merged);
        assert!(pr.merged);

        let raw: GitLabMergeRequest = serde_json::from_str(&mr_json("closed", None)).expect("json");
        assert_eq!(pull_request(raw, &repo).state, PullRequestState::Closed);
    }

    #[test]
    fn merged_at_overrides_raw_state() {
        assert_eq!(merge_request_state("closed", true), PullRequestState::Merged);
        assert_eq!(merge_request_state("locked", false), PullRequestState::Open);
    }

    #[test]
    fn issue_uses_iid_as_number() {
        let raw: GitLabIssue = serde_json::from_str(
            r#"{
                "id": 900, "iid": 4, "title": "Broken", "description": null, "state": "opened",
                "labels": ["bug", "p1"], "author": {"id": 3, "username": "jdoe"},
                "assignees": [{"id": 4, "username": "alice"}],
                "milestone": {"id": 7, "iid": 1, "title": "v1", "description": null,
                              "state": "active", "due_date": "2024-06-30"},
                "user_notes_count": 2, "web_url": "https://gitlab.com/g/p/-/issues/4",
                "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z",
                "closed_at": null
            }"#,
        )
        .expect("json");
        let issue = issue(raw, &RepoId::new("g", "p"));
        assert_eq!(issue.id, 900);
        assert_eq!(issue.number, 4);
        assert_eq!(issue.state, IssueState::Open);
        assert_eq!(issue.labels.len(), 2);
        assert_eq!(issue.assignees[0].login, "alice");
        let milestone = issue.milestone.expect("milestone");
        assert_eq!(milestone.state, IssueState::Open);
        assert_eq!(milestone.due_on.map(|d| d.to_string()).as_deref(), Some("2024-06-30"));
    }

    #[test]
    fn nested_namespace_becomes_owner() {
        let raw: GitLabProject = serde_json::from_str(
            r#"{
                "id": 42, "name": "My Project", "path": "my-project",
                "path_with_namespace": "group/subgroup/my-project",
                "description": null, "visibility": "internal", "tag_list": ["legacy"],
                "namespace": {"id": 9, "name": "Subgroup", "path": "subgroup",
                              "full_path": "group/subgroup", "kind": "group"},
                "web_url": "https://gitlab.com/group/subgroup/my-project"
            }"#,
        )
        .expect("json");
        let repo = repository(raw);
        assert_eq!(repo.owner, "group/subgroup");
        assert_eq!(repo.name, "my-project");
        assert_eq!(repo.full_name, "group/subgroup/my-project");
        assert_eq!(repo.visibility, Visibility::Internal);
        assert_eq!(repo.owner_account.kind, UserType::Organization);
        assert_eq!(repo.topics, vec!["legacy"]);
        assert_eq!(repo.open_issues, 0);
    }
}
