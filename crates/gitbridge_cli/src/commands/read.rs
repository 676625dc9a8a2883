//! Read-only commands: repositories, search, issues, pull requests, users,
//! commits and releases.

use gitbridge::platform::{
    CommitQuery, ListQuery, PageQuery, SearchQuery, SearchSort, SortOrder, StateFilter,
};
use gitbridge::{PlatformClient, RepoId};

use super::output::{
    CommitRow, IssueRow, OutputFormat, PullRequestRow, ReleaseRow, RepoRow, UserRow, emit,
    emit_one,
};
use super::parse_issue_ref;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Filters shared by `issues` and `prs`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ListOptions {
    /// State to list (open, closed, merged, all)
    #[arg(short, long, default_value_t = StateFilter::Open)]
    pub state: StateFilter,

    /// Only items with this label (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Only items assigned to this login
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Only items opened by this login
    #[arg(long)]
    pub author: Option<String>,

    #[command(flatten)]
    pub paging: PageOptions,
}

impl ListOptions {
    fn to_query(&self) -> ListQuery {
        ListQuery {
            state: self.state,
            labels: self.labels.clone(),
            assignee: self.assignee.clone(),
            author: self.author.clone(),
            page: self.paging.page,
            per_page: self.paging.per_page,
            force_refresh: self.paging.refresh,
        }
    }
}

/// Paging options shared by every list command.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PageOptions {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page (max 100)
    #[arg(long, default_value_t = gitbridge::platform::DEFAULT_PER_PAGE)]
    pub per_page: u32,

    /// Bypass the response cache
    #[arg(long)]
    pub refresh: bool,
}

impl PageOptions {
    fn to_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
            force_refresh: self.refresh,
        }
    }
}

/// Sort keys accepted by `search`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(crate) enum SortKey {
    Stars,
    Forks,
    Updated,
}

impl From<SortKey> for SearchSort {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Stars => SearchSort::Stars,
            SortKey::Forks => SearchSort::Forks,
            SortKey::Updated => SearchSort::Updated,
        }
    }
}

/// Fetch one or more repositories. Several ids are fetched as a batch and
/// failures are reported without aborting the others.
pub(crate) async fn handle_repo(
    client: &dyn PlatformClient,
    ids: &[String],
    output: OutputFormat,
) -> CmdResult {
    let ids = ids
        .iter()
        .map(|id| client.parse_repo_id(id))
        .collect::<Result<Vec<RepoId>, _>>()?;

    if let [id] = ids.as_slice() {
        let repo = client.get_repository(id).await?;
        emit_one::<_, RepoRow>(&repo, output)?;
        return Ok(());
    }

    let batch = client.get_repositories(&ids).await;
    emit::<_, RepoRow>(&batch.succeeded, output)?;
    for (id, err) in &batch.failed {
        eprintln!("{id}: {err}");
    }
    if batch.has_errors() {
        return Err(format!(
            "{} of {} repositories could not be fetched",
            batch.failed.len(),
            ids.len()
        )
        .into());
    }
    Ok(())
}

pub(crate) async fn handle_search(
    client: &dyn PlatformClient,
    query: String,
    sort: Option<SortKey>,
    ascending: bool,
    paging: &PageOptions,
    output: OutputFormat,
) -> CmdResult {
    let mut search = SearchQuery::new(query).with_page(paging.page, paging.per_page);
    if let Some(sort) = sort {
        let order = if ascending {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };
        search = search.sort_by(sort.into(), order);
    }
    if paging.refresh {
        search = search.refresh();
    }

    let results = client.search_repositories(&search).await?;
    emit::<_, RepoRow>(&results.items, output)?;
    if matches!(output, OutputFormat::Table) {
        let mut footer = format!(
            "page {} ({} per page), {} total",
            results.page, results.per_page, results.total_count
        );
        if results.has_next {
            footer.push_str(&format!(", next: --page {}", results.page + 1));
        }
        eprintln!("{footer}");
    }
    Ok(())
}

pub(crate) async fn handle_issues(
    client: &dyn PlatformClient,
    repo: &str,
    options: &ListOptions,
    output: OutputFormat,
) -> CmdResult {
    let repo = client.parse_repo_id(repo)?;
    let issues = client.get_issues(&repo, &options.to_query()).await?;
    emit::<_, IssueRow>(&issues, output)?;
    Ok(())
}

pub(crate) async fn handle_issue(
    client: &dyn PlatformClient,
    reference: &str,
    output: OutputFormat,
) -> CmdResult {
    let issue = client
        .get_issue(&parse_issue_ref(client, reference)?)
        .await?;
    emit_one::<_, IssueRow>(&issue, output)?;
    Ok(())
}

pub(crate) async fn handle_pull_requests(
    client: &dyn PlatformClient,
    repo: &str,
    options: &ListOptions,
    output: OutputFormat,
) -> CmdResult {
    let repo = client.parse_repo_id(repo)?;
    let prs = client.get_pull_requests(&repo, &options.to_query()).await?;
    emit::<_, PullRequestRow>(&prs, output)?;
    Ok(())
}

pub(crate) async fn handle_pull_request(
    client: &dyn PlatformClient,
    reference: &str,
    output: OutputFormat,
) -> CmdResult {
    let pr = client
        .get_pull_request(&parse_issue_ref(client, reference)?)
        .await?;
    emit_one::<_, PullRequestRow>(&pr, output)?;
    Ok(())
}

pub(crate) async fn handle_user(
    client: &dyn PlatformClient,
    login: &str,
    output: OutputFormat,
) -> CmdResult {
    let user = client.get_user(login).await?;
    emit_one::<_, UserRow>(&user, output)?;
    Ok(())
}

pub(crate) async fn handle_commits(
    client: &dyn PlatformClient,
    repo: &str,
    ref_name: Option<String>,
    path: Option<String>,
    paging: &PageOptions,
    output: OutputFormat,
) -> CmdResult {
    let repo = client.parse_repo_id(repo)?;
    let query = CommitQuery {
        ref_name,
        path,
        paging: paging.to_query(),
    };
    let commits = client.list_commits(&repo, &query).await?;
    emit::<_, CommitRow>(&commits, output)?;
    Ok(())
}

pub(crate) async fn handle_releases(
    client: &dyn PlatformClient,
    repo: &str,
    paging: &PageOptions,
    output: OutputFormat,
) -> CmdResult {
    let repo = client.parse_repo_id(repo)?;
    let releases = client.list_releases(&repo, &paging.to_query()).await?;
    emit::<_, ReleaseRow>(&releases, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_options_map_onto_query() {
        let options = ListOptions {
            state: StateFilter::Merged,
            labels: vec!["bug".to_string()],
            assignee: Some("alice".to_string()),
            author: None,
            paging: PageOptions {
                page: 2,
                per_page: 50,
                refresh: true,
            },
        };
        let query = options.to_query();
        assert_eq!(query.state, StateFilter::Merged);
        assert_eq!(query.labels, vec!["bug"]);
        assert_eq!(query.assignee.as_deref(), Some("alice"));
        assert_eq!(query.page, 2);
        assert_eq!(query.per_page, 50);
        assert!(query.force_refresh);
    }

    #[test]
    fn sort_keys_map_onto_search_sort() {
        assert_eq!(SearchSort::from(SortKey::Stars), SearchSort::Stars);
        assert_eq!(SearchSort::from(SortKey::Forks), SearchSort::Forks);
        assert_eq!(SearchSort::from(SortKey::Updated), SearchSort::Updated);
    }
}
