//! Subversion command abstractions
//!
//! Provides the `VersionControl` trait consumed by the branch workflows and a
//! `SvnClient` that drives the `svn` command-line tool through a
//! `CommandExecutor`.

use super::command::{command_line, CommandError, CommandExecutor, CommandOutput};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub type BranchName = String;

const CONFLICTS_ERROR_CODE: &str = "E155015";
const CONFLICT_SUMMARY: &str = "Summary of conflicts:";

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
}

/// Captured output of one VCS invocation, kept for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub command: String,
    pub output: String,
}

impl Transcript {
    pub fn new(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.output.contains(needle)
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.command)?;
        write!(f, "{}", self.output)
    }
}

/// How a merge treats conflicting changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Record conflicts in the working copy and keep going.
    Postpone,
    /// Merge a finished branch back into a trunk working copy, postponing conflicts.
    Reintegrate,
}

/// Version-control operations used by the branch workflows.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// List branch names directly under `branch_root`.
    async fn list_branches(&self, branch_root: &str) -> Result<Vec<BranchName>, VcsError>;

    /// Check `source_url` out into `destination`.
    async fn checkout(&self, source_url: &str, destination: &Path)
        -> Result<Transcript, VcsError>;

    /// Merge `source_url` into the working copy at `working_dir`.
    ///
    /// Conflicts do not fail the call; they show up in the transcript, even
    /// when the tool exits non-zero because of them.
    async fn merge(
        &self,
        source_url: &str,
        working_dir: &Path,
        mode: MergeMode,
    ) -> Result<Transcript, VcsError>;

    /// Commit everything in `working_dir`.
    async fn commit(&self, working_dir: &Path, message: &str) -> Result<Transcript, VcsError>;

    /// Server-side copy, used to create branches.
    async fn copy(&self, from_url: &str, to_url: &str, message: &str)
        -> Result<Transcript, VcsError>;

    /// Server-side delete, used to drop reintegrated branches.
    async fn delete(&self, url: &str, message: &str) -> Result<Transcript, VcsError>;

    /// Unified diff between two URLs.
    async fn diff(&self, old_url: &str, new_url: &str) -> Result<String, VcsError>;
}

/// Real Subversion implementation
pub struct SvnClient {
    executor: Arc<dyn CommandExecutor>,
}

impl SvnClient {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    async fn invoke(
        &self,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<(String, CommandOutput), VcsError> {
        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.extend_from_slice(args);
        full_args.push("--non-interactive");

        let output = self.executor.execute("svn", &full_args, cwd).await?;
        Ok((command_line("svn", &full_args), output))
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<Transcript, VcsError> {
        let (command, output) = self.invoke(args, cwd).await?;
        if !output.success() {
            return Err(command_failed(command, &output));
        }
        Ok(Transcript::new(command, output.stdout))
    }

    /// Run a merge, keeping its output when svn exits non-zero over conflicts.
    async fn run_merge(&self, args: &[&str], working_dir: &Path) -> Result<Transcript, VcsError> {
        let (command, output) = self.invoke(args, Some(working_dir)).await?;
        if output.success() {
            return Ok(Transcript::new(command, output.stdout));
        }
        if !left_conflicts(&output) {
            return Err(command_failed(command, &output));
        }

        debug!(status = output.status_code, "merge exited non-zero with conflicts");
        let mut text = output.stdout;
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&output.stderr);
        Ok(Transcript::new(command, text))
    }
}

/// svn exits 1 once postponed conflicts block the remaining revision ranges.
fn left_conflicts(output: &CommandOutput) -> bool {
    output.stderr.contains(CONFLICTS_ERROR_CODE) || output.stdout.contains(CONFLICT_SUMMARY)
}

fn command_failed(command: String, output: &CommandOutput) -> VcsError {
    VcsError::CommandFailed {
        command,
        status: output.status_code,
        stderr: output.stderr.trim().to_string(),
    }
}

/// Strip the trailing `/` that `svn ls` prints for directories, plus whitespace.
pub fn normalize_branch_name(raw: &str) -> &str {
    raw.trim()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
}

#[async_trait]
impl VersionControl for SvnClient {
    async fn list_branches(&self, branch_root: &str) -> Result<Vec<BranchName>, VcsError> {
        let listing = self.run(&["ls", branch_root], None).await?;

        Ok(listing
            .output
            .lines()
            .map(normalize_branch_name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn checkout(
        &self,
        source_url: &str,
        destination: &Path,
    ) -> Result<Transcript, VcsError> {
        let destination = destination.to_string_lossy();
        self.run(&["checkout", source_url, &*destination], None).await
    }

    async fn merge(
        &self,
        source_url: &str,
        working_dir: &Path,
        mode: MergeMode,
    ) -> Result<Transcript, VcsError> {
        match mode {
            MergeMode::Postpone => {
                self.run_merge(&["merge", "--accept", "postpone", source_url], working_dir)
                    .await
            }
            MergeMode::Reintegrate => {
                self.run_merge(
                    &["merge", "--reintegrate", "--accept", "postpone", source_url],
                    working_dir,
                )
                .await
            }
        }
    }

    async fn commit(&self, working_dir: &Path, message: &str) -> Result<Transcript, VcsError> {
        self.run(&["commit", "-m", message], Some(working_dir)).await
    }

    async fn copy(
        &self,
        from_url: &str,
        to_url: &str,
        message: &str,
    ) -> Result<Transcript, VcsError> {
        self.run(&["copy", from_url, to_url, "-m", message], None).await
    }

    async fn delete(&self, url: &str, message: &str) -> Result<Transcript, VcsError> {
        self.run(&["delete", url, "-m", message], None).await
    }

    async fn diff(&self, old_url: &str, new_url: &str) -> Result<String, VcsError> {
        let old = format!("--old={old_url}");
        let new = format!("--new={new_url}");
        Ok(self
            .run(&["diff", old.as_str(), new.as_str()], None)
            .await?
            .output)
    }
}
