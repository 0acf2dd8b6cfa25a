// air library - ticket-driven branching over Jira, Subversion and Crucible
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod crucible;
pub mod external;
pub mod http;
pub mod jira;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{AirConfig, CrucibleConfig, JiraConfig, SvnConfig};
pub use crucible::{CrucibleClient, CrucibleError, ReviewSystem};
pub use external::{CommandExecutor, ProcessCommandExecutor, SvnClient, VcsError, VersionControl};
pub use http::{HttpConfig, RateLimitedHttpClient};
pub use jira::{IssueTracker, JiraClient, JiraError};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
pub use workflows::{
    reintegrate, BranchResolver, MergeReport, RefreshError, RefreshOrchestrator, RefreshSettings,
    ResolveError,
};
