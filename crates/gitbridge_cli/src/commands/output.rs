//! Table and JSON rendering for command results.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use gitbridge::{Commit, Issue, PullRequest, Release, Repository, User};
use serde::Serialize;
use tabled::Tabled;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Print `items` as a table of `R` rows, or as the full JSON documents.
pub(crate) fn emit<T, R>(items: &[T], format: OutputFormat) -> Result<(), serde_json::Error>
where
    T: Serialize,
    R: Tabled + for<'a> From<&'a T>,
{
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(items.iter().map(R::from));
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
    }
    Ok(())
}

/// Print a single item.
pub(crate) fn emit_one<T, R>(item: &T, format: OutputFormat) -> Result<(), serde_json::Error>
where
    T: Serialize,
    R: Tabled + for<'a> From<&'a T>,
{
    match format {
        OutputFormat::Table => emit::<T, R>(std::slice::from_ref(item), format),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item)?);
            Ok(())
        }
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string())
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[derive(Tabled)]
pub(crate) struct RepoRow {
    #[tabled(rename = "Repository")]
    pub name: String,
    #[tabled(rename = "Visibility")]
    pub visibility: String,
    #[tabled(rename = "Stars")]
    pub stars: u64,
    #[tabled(rename = "Forks")]
    pub forks: u64,
    #[tabled(rename = "Open Issues")]
    pub open_issues: u64,
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&Repository> for RepoRow {
    fn from(repo: &Repository) -> Self {
        let mut visibility = repo.visibility.to_string();
        if repo.is_archived {
            visibility.push_str(" (archived)");
        }
        Self {
            name: repo.full_name.clone(),
            visibility,
            stars: repo.stars,
            forks: repo.forks,
            open_issues: repo.open_issues,
            language: or_dash(repo.language.as_deref()),
            updated: date(repo.updated_at),
            description: truncate(repo.description.as_deref().unwrap_or(""), 60),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct IssueRow {
    #[tabled(rename = "#")]
    pub number: u64,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Author")]
    pub author: String,
    #[tabled(rename = "Labels")]
    pub labels: String,
    #[tabled(rename = "Comments")]
    pub comments: u64,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            number: issue.number,
            state: issue.state.to_string(),
            title: truncate(&issue.title, 60),
            author: or_dash(issue.author.as_ref().map(|a| a.login.as_str())),
            labels: issue
                .labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            comments: issue.comments,
            updated: date(Some(issue.updated_at)),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct PullRequestRow {
    #[tabled(rename = "#")]
    pub number: u64,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Author")]
    pub author: String,
    #[tabled(rename = "Branches")]
    pub branches: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&PullRequest> for PullRequestRow {
    fn from(pr: &PullRequest) -> Self {
        let mut state = pr.state.to_string();
        if pr.draft {
            state.push_str(" (draft)");
        }
        Self {
            number: pr.number,
            state,
            title: truncate(&pr.title, 60),
            author: or_dash(pr.author.as_ref().map(|a| a.login.as_str())),
            branches: format!("{} -> {}", pr.head_branch, pr.base_branch),
            updated: date(Some(pr.updated_at)),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct UserRow {
    #[tabled(rename = "Login")]
    pub login: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Company")]
    pub company: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Followers")]
    pub followers: String,
    #[tabled(rename = "Joined")]
    pub joined: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.clone(),
            name: or_dash(user.name.as_deref()),
            kind: user.kind.to_string(),
            company: or_dash(user.company.as_deref()),
            location: or_dash(user.location.as_deref()),
            followers: user
                .followers
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            joined: date(user.created_at),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct CommitRow {
    #[tabled(rename = "SHA")]
    pub sha: String,
    #[tabled(rename = "Author")]
    pub author: String,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

impl From<&Commit> for CommitRow {
    fn from(commit: &Commit) -> Self {
        let author = commit
            .author
            .as_ref()
            .map(|a| a.login.as_str())
            .or(commit.author_name.as_deref());
        Self {
            sha: commit.sha.chars().take(10).collect(),
            author: or_dash(author),
            date: date(commit.committed_at.or(commit.authored_at)),
            message: truncate(commit.message.lines().next().unwrap_or(""), 72),
        }
    }
}

#[derive(Tabled)]
pub(crate) struct ReleaseRow {
    #[tabled(rename = "Tag")]
    pub tag: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Published")]
    pub published: String,
}

impl From<&Release> for ReleaseRow {
    fn from(release: &Release) -> Self {
        let kind = if release.draft {
            "draft"
        } else if release.prerelease {
            "prerelease"
        } else {
            "release"
        };
        Self {
            tag: release.tag_name.clone(),
            name: or_dash(release.name.as_deref()),
            kind: kind.to_string(),
            published: date(release.published_at.or(release.created_at)),
        }
    }
}
