//! Ticket helpers: branch naming and inferring the ticket from a working copy.

use crate::external::command::CommandExecutor;
use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("ticket number required")]
    Required,
}

/// Branch name for a ticket: `KEY_` followed by the form-encoded summary.
pub fn make_branch_name(key: &str, summary: &str) -> String {
    let text = summary.replace(' ', "_").replace('/', "-");
    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    format!("{key}_{encoded}")
}

/// Extract the ticket key from `svn info` style output.
pub fn parse_ticket(info: &str) -> Option<String> {
    let url_line = Regex::new(r"(?m)^URL:\s*(\S+)\s*$").ok()?;
    let ticket_prefix = Regex::new(r"^(\S+-\d+)_").ok()?;

    let url = url_line.captures(info)?.get(1)?.as_str();
    let branch = url.trim_end_matches('/').rsplit('/').next()?;
    ticket_prefix
        .captures(branch)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Infer the ticket from the working copy at `dir`, if it is a branch checkout.
pub async fn ticket_from_working_copy(executor: &dyn CommandExecutor, dir: &Path) -> Option<String> {
    let output = if dir.join(".svn").is_dir() {
        executor.execute("svn", &["info"], Some(dir)).await
    } else if dir.join(".git").is_dir() {
        executor.execute("git", &["svn", "info"], Some(dir)).await
    } else {
        return None;
    };

    match output {
        Ok(output) if output.success() => parse_ticket(&output.stdout),
        Ok(output) => {
            debug!(status = output.status_code, "working copy info failed");
            None
        }
        Err(e) => {
            debug!(error = %e, "working copy info unavailable");
            None
        }
    }
}

/// Use `explicit` when given, otherwise fall back to the working copy at `dir`.
pub async fn require_ticket(
    explicit: Option<&str>,
    executor: &dyn CommandExecutor,
    dir: &Path,
) -> Result<String, TicketError> {
    if let Some(ticket) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(ticket.to_string());
    }
    ticket_from_working_copy(executor, dir)
        .await
        .ok_or(TicketError::Required)
}
