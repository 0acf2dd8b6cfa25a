use crate::http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("'{status}' is not a valid status for {ticket}. Valid transitions: {}", valid.join(", "))]
    InvalidTransition {
        ticket: String,
        status: String,
        valid: Vec<String>,
    },
    #[error("issue {0} not found")]
    IssueNotFound(String),
    #[error("no favourite filter named '{0}'")]
    FilterNotFound(String),
    #[error("Jira request failed: {0}")]
    Http(#[from] HttpError),
}
