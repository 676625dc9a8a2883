pub(crate) mod limits;
pub(crate) mod output;
pub(crate) mod read;
pub(crate) mod webhook;
pub(crate) mod write;

use gitbridge::{IssueRef, PlatformClient};

/// Parse `owner/repo#number` against the client's platform.
pub(crate) fn parse_issue_ref(
    client: &dyn PlatformClient,
    input: &str,
) -> Result<IssueRef, Box<dyn std::error::Error>> {
    let (repo, number) = input
        .rsplit_once('#')
        .ok_or_else(|| format!("expected owner/repo#number, got {input:?}"))?;
    let number: u64 = number
        .parse()
        .map_err(|_| format!("invalid issue number {number:?} in {input:?}"))?;
    Ok(IssueRef::new(client.parse_repo_id(repo)?, number))
}
