use crate::config::JiraQueryConfig;
use crate::jira::{run_configured_query, status, IssueKind, IssueTracker};
use anyhow::{Context, Result};
use std::io::Write;

pub const DEFAULT_LIST_JQL: &str =
    "assignee=currentUser() AND status != Closed AND status != Resolved";
pub const DEFAULT_REVIEW_JQL: &str = r#"status IN ("Ready for Review", "In Review")"#;
pub const REJECT_COMMENT: &str = "Sending issue back for rework. Please see comments in review.";

/// Print `KEY:<tab>summary` for each issue the configured query returns.
pub async fn list_issues(
    tracker: &dyn IssueTracker,
    query: &JiraQueryConfig,
    default_jql: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let issues = run_configured_query(tracker, query, default_jql)
        .await
        .context("failed to list tickets")?;
    for issue in issues {
        writeln!(out, "{}:\t{}", issue.key, issue.summary())?;
    }
    Ok(())
}

pub async fn create_issue(
    tracker: &dyn IssueTracker,
    kind: IssueKind,
    text: &str,
    out: &mut dyn Write,
) -> Result<String> {
    let key = tracker
        .create_issue(text, text, kind)
        .await
        .with_context(|| format!("failed to create {}", kind.as_str().to_lowercase()))?;
    writeln!(out, "{} created: {key}", kind.as_str().to_lowercase())?;
    Ok(key)
}

pub async fn finish_work(tracker: &dyn IssueTracker, ticket: &str, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Marking issue {ticket} as \"{}\"", status::READY_FOR_REVIEW)?;
    tracker.transition_issue(ticket, status::READY_FOR_REVIEW).await?;
    Ok(())
}

pub async fn reject_ticket(
    tracker: &dyn IssueTracker,
    ticket: &str,
    out: &mut dyn Write,
) -> Result<()> {
    tracker.add_comment(ticket, REJECT_COMMENT).await?;
    tracker.transition_issue(ticket, status::REOPEN).await?;
    writeln!(out, "{ticket} sent back for rework")?;
    Ok(())
}

pub async fn close_ticket(
    tracker: &dyn IssueTracker,
    ticket: &str,
    close_status: &str,
    out: &mut dyn Write,
) -> Result<()> {
    tracker.transition_issue(ticket, close_status).await?;
    writeln!(out, "{ticket} closed")?;
    Ok(())
}

pub async fn assign(
    tracker: &dyn IssueTracker,
    ticket: &str,
    person: &str,
    out: &mut dyn Write,
) -> Result<()> {
    tracker.assign_issue(ticket, person).await?;
    writeln!(out, "{ticket} assigned to {person}")?;
    Ok(())
}

pub async fn add_watcher(
    tracker: &dyn IssueTracker,
    ticket: &str,
    person: &str,
    out: &mut dyn Write,
) -> Result<()> {
    tracker.add_watcher(ticket, person).await?;
    writeln!(out, "{person} is now watching {ticket}")?;
    Ok(())
}

pub async fn add_comment(
    tracker: &dyn IssueTracker,
    ticket: &str,
    comment: &str,
    out: &mut dyn Write,
) -> Result<()> {
    tracker.add_comment(ticket, comment).await?;
    writeln!(out, "Comment added to {ticket}")?;
    Ok(())
}
