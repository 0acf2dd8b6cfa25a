pub mod client;
pub mod errors;
pub mod types;

pub use client::{run_configured_query, IssueTracker, JiraClient};
pub use errors::JiraError;
pub use types::{status, Filter, Issue, IssueKind, Transition};

#[cfg(any(test, feature = "testing"))]
pub use client::MockIssueTracker;
