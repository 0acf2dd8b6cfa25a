use crate::external::{BranchName, VersionControl};
use crate::jira::{status, IssueTracker};
use crate::workflows::{make_branch_name, BranchResolver, RefreshError, RefreshOrchestrator, RefreshSettings};
use anyhow::{Context, Result};
use std::io::Write;

pub const REFRESH_COMMENT: &str = "Branch has been refreshed from trunk";

/// Copy trunk to a new branch named after the ticket.
pub async fn make_branch(
    tracker: &dyn IssueTracker,
    vcs: &dyn VersionControl,
    settings: &RefreshSettings,
    ticket: &str,
    out: &mut dyn Write,
) -> Result<BranchName> {
    let issue = tracker.get_issue(ticket).await?;
    let branch = make_branch_name(&issue.key, issue.summary());
    let url = settings.branch_url(&branch);

    writeln!(out, "🌿 Creating branch {branch}")?;
    let transcript = vcs
        .copy(
            &settings.trunk_url,
            &url,
            &format!("created branch for {}", issue.key),
        )
        .await
        .with_context(|| format!("failed to create branch {branch}"))?;
    writeln!(out, "{transcript}")?;

    Ok(branch)
}

pub async fn start_work(
    tracker: &dyn IssueTracker,
    vcs: &dyn VersionControl,
    settings: &RefreshSettings,
    ticket: &str,
    out: &mut dyn Write,
) -> Result<()> {
    make_branch(tracker, vcs, settings, ticket, out).await?;

    writeln!(out, "Marking issue {ticket} as \"{}\"", status::IN_PROGRESS)?;
    tracker.transition_issue(ticket, status::IN_PROGRESS).await?;

    let branch = BranchResolver::new(vcs, &settings.branch_root)
        .resolve(ticket)
        .await?;
    writeln!(out, "Adding SVN URL for branch to Jira issue")?;
    tracker
        .add_comment(ticket, &format!("SVN URL: {}", settings.branch_url(&branch)))
        .await?;

    Ok(())
}

/// Merge trunk into the ticket's branch and note it on the ticket.
///
/// On a conflict the merge transcript is printed so the user can see which
/// files need a manual merge, and nothing is committed.
pub async fn refresh(
    tracker: &dyn IssueTracker,
    vcs: &dyn VersionControl,
    settings: &RefreshSettings,
    ticket: &str,
    out: &mut dyn Write,
) -> Result<()> {
    writeln!(out, "🔄 Refreshing branch for {ticket} from trunk")?;

    let report = match RefreshOrchestrator::new(vcs, settings).refresh(ticket).await {
        Ok(report) => report,
        Err(err) => {
            if let RefreshError::MergeConflict { transcript, .. } = &err {
                writeln!(out, "{transcript}")?;
            }
            return Err(err.into());
        }
    };

    for transcript in [&report.checkout, &report.merge, &report.commit] {
        writeln!(out, "{transcript}")?;
    }
    tracker.add_comment(ticket, REFRESH_COMMENT).await?;
    writeln!(out, "✅ Branch {} refreshed from trunk", report.branch)?;

    Ok(())
}
