//! Hidden helpers behind shell completion scripts.

use crate::cli::aliases::{effective_aliases, normalize_command_name};
use crate::cli::Cli;
use crate::config::JiraQueryConfig;
use crate::jira::{run_configured_query, IssueTracker};
use anyhow::Result;
use clap::CommandFactory;
use std::collections::BTreeMap;
use std::io::Write;

use super::tickets::DEFAULT_LIST_JQL;

pub async fn complete_tickets(
    tracker: &dyn IssueTracker,
    query: &JiraQueryConfig,
    out: &mut dyn Write,
) -> Result<()> {
    for issue in run_configured_query(tracker, query, DEFAULT_LIST_JQL).await? {
        writeln!(out, "{}:{}", issue.key, issue.summary())?;
    }
    Ok(())
}

/// `name:about` for every visible subcommand, then every alias.
pub fn complete_subcommands(configured: &BTreeMap<String, String>, out: &mut dyn Write) -> Result<()> {
    let cli = Cli::command();
    for sub in cli.get_subcommands().filter(|s| !s.is_hide_set()) {
        let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
        writeln!(out, "{}:{}", sub.get_name(), about)?;
    }
    for (alias, target) in effective_aliases(configured) {
        writeln!(out, "{alias}:alias for {}", normalize_command_name(&target))?;
    }
    Ok(())
}

pub async fn complete_persons(tracker: &dyn IssueTracker, out: &mut dyn Write) -> Result<()> {
    for name in tracker.assignable_users().await? {
        writeln!(out, "{name}")?;
    }
    Ok(())
}
