use gitbridge::PlatformClient;
use gitbridge::platform::{IssueUpdate, NewIssue};

use super::output::{IssueRow, OutputFormat, emit_one};
use super::parse_issue_ref;

pub(crate) async fn handle_create_issue(
    client: &dyn PlatformClient,
    repo: &str,
    issue: NewIssue,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = client.parse_repo_id(repo)?;
    let created = client.create_issue(&repo, &issue).await?;
    tracing::info!(
        platform = %client.platform(),
        repo = %repo,
        number = created.number,
        "Created issue"
    );
    emit_one::<_, IssueRow>(&created, output)?;
    Ok(())
}

pub(crate) async fn handle_close_issue(
    client: &dyn PlatformClient,
    reference: &str,
    reopen: bool,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = parse_issue_ref(client, reference)?;
    let update = if reopen {
        IssueUpdate::reopen()
    } else {
        IssueUpdate::close()
    };
    let updated = client.update_issue(&target, &update).await?;
    emit_one::<_, IssueRow>(&updated, output)?;
    Ok(())
}
