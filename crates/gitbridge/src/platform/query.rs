//! Query and write-payload types accepted by [`PlatformClient`](super::PlatformClient).

use serde::{Deserialize, Serialize};

use super::types::IssueState;

/// Default page size when the caller does not choose one.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Largest page size either provider accepts.
pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// State filter for issue and pull request listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    /// Pull/merge requests only.
    Merged,
    All,
}

impl StateFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::Merged => "merged",
            StateFilter::All => "all",
        }
    }
}

impl std::fmt::Display for StateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" | "opened" => Ok(StateFilter::Open),
            "closed" => Ok(StateFilter::Closed),
            "merged" => Ok(StateFilter::Merged),
            "all" => Ok(StateFilter::All),
            other => Err(format!("unknown state {other:?}")),
        }
    }
}

/// Filters and paging for issue and pull request listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub state: StateFilter,
    /// Only items carrying all of these labels.
    #[serde(default)]
    pub labels: Vec<String>,
    pub assignee: Option<String>,
    pub author: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Skip the cache and overwrite whatever it holds for this query.
    #[serde(default)]
    pub force_refresh: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            state: StateFilter::default(),
            labels: Vec::new(),
            assignee: None,
            author: None,
            page: default_page(),
            per_page: default_per_page(),
            force_refresh: false,
        }
    }
}

impl ListQuery {
    #[must_use]
    pub fn with_state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    #[must_use]
    pub fn refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// Sort key for repository search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    Stars,
    Forks,
    Updated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Repository search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub sort: Option<SearchSort>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub force_refresh: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sort: None,
            order: SortOrder::default(),
            page: default_page(),
            per_page: default_per_page(),
            force_refresh: false,
        }
    }

    #[must_use]
    pub fn sort_by(mut self, sort: SearchSort, order: SortOrder) -> Self {
        self.sort = Some(sort);
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    #[must_use]
    pub fn refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// Plain paging, used for releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub force_refresh: bool,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            force_refresh: false,
        }
    }
}

/// Commit history listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitQuery {
    /// Branch, tag or SHA to start from. Defaults to the default branch.
    pub ref_name: Option<String>,
    /// Only commits touching this path.
    pub path: Option<String>,
    #[serde(flatten)]
    pub paging: PageQuery,
}

/// Fields for a new issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Logins to assign.
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Milestone number (GitHub) or id (GitLab).
    pub milestone: Option<u64>,
}

impl NewIssue {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = assignees.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update of an issue. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<IssueState>,
    /// Replaces the full label set.
    pub labels: Option<Vec<String>>,
    /// Replaces the full assignee set.
    pub assignees: Option<Vec<String>>,
    pub milestone: Option<u64>,
}

impl IssueUpdate {
    #[must_use]
    pub fn close() -> Self {
        Self {
            state: Some(IssueState::Closed),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reopen() -> Self {
        Self {
            state: Some(IssueState::Open),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let q = ListQuery::default();
        assert_eq!(q.state, StateFilter::Open);
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 30);
        assert!(!q.force_refresh);
    }

    #[test]
    fn list_query_deserializes_with_defaults() {
        let q: ListQuery = serde_json::from_str(r#"{"state":"closed","labels":["bug"]}"#)
            .expect("deserialize");
        assert_eq!(q.state, StateFilter::Closed);
        assert_eq!(q.labels, vec!["bug".to_string()]);
        assert_eq!(q.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn state_filter_parses_gitlab_spelling() {
        assert_eq!("opened".parse::<StateFilter>(), Ok(StateFilter::Open));
        assert_eq!("ALL".parse::<StateFilter>(), Ok(StateFilter::All));
        assert!("draft".parse::<StateFilter>().is_err());
    }

    #[test]
    fn issue_update_emptiness() {
        assert!(IssueUpdate::default().is_empty());
        assert!(!IssueUpdate::close().is_empty());
    }

    #[test]
    fn new_issue_builder() {
        let issue = NewIssue::new("Crash on start")
            .with_body("details")
            .with_labels(["bug", "p1"])
            .with_assignees(["octocat"]);
        assert_eq!(issue.labels, vec!["bug", "p1"]);
        assert_eq!(issue.assignees, vec!["octocat"]);
        assert_eq!(issue.body.as_deref(), Some("details"));
    }
}
