//! Branch refresh: bring a ticket's branch up to date with trunk.
//!
//! The refresh runs as a fixed sequence of stages against a scratch working
//! directory:
//!
//! ```text
//! ResolveBranch -> AcquireWorkdir -> Checkout -> Merge -> ClassifyMerge -> Commit -> Cleanup
//! ```
//!
//! A conflicted merge stops before `Commit`. Whatever happens after
//! `AcquireWorkdir`, the scratch directory is released exactly once before the
//! result is returned.

use super::resolver::{BranchResolver, ResolveError};
use super::workdir::ScratchWorkdir;
use crate::config::SvnConfig;
use crate::external::svn::{BranchName, MergeMode, Transcript, VcsError, VersionControl};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFLICT_MARKER: &str = "conflicts";
pub const DEFAULT_REFRESH_MESSAGE: &str = "refreshed from trunk";

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("unable to create scratch working directory: {0}")]
    Workdir(#[source] io::Error),
    #[error("unable to check out {url}: {source}")]
    Checkout {
        url: String,
        #[source]
        source: VcsError,
    },
    #[error("merge into {branch} failed: {source}")]
    Merge {
        branch: BranchName,
        #[source]
        source: VcsError,
    },
    #[error("unable to merge into {branch} due to conflicts; merge manually")]
    MergeConflict {
        branch: BranchName,
        transcript: Transcript,
    },
    #[error("commit to {branch} failed: {source}")]
    Commit {
        branch: BranchName,
        #[source]
        source: VcsError,
    },
}

/// Stages of a scratch-directory merge, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    ResolveBranch,
    AcquireWorkdir,
    Checkout,
    Merge,
    ClassifyMerge,
    Commit,
    Cleanup,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::ResolveBranch => "resolve-branch",
            RefreshStage::AcquireWorkdir => "acquire-workdir",
            RefreshStage::Checkout => "checkout",
            RefreshStage::Merge => "merge",
            RefreshStage::ClassifyMerge => "classify-merge",
            RefreshStage::Commit => "commit",
            RefreshStage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Best-effort conflict detection on a merge transcript.
///
/// `svn merge --accept postpone` ends with a "Summary of conflicts:" block
/// when anything was left unresolved. The wording is locale and version
/// dependent, so a missing marker does not prove a clean merge.
pub fn has_conflicts(transcript: &Transcript, marker: &str) -> bool {
    transcript.contains(marker)
}

/// Locations and wording used by branch merges.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub branch_root: String,
    pub trunk_url: String,
    pub scratch_dir: Option<PathBuf>,
    pub conflict_marker: String,
    pub commit_message: String,
}

impl RefreshSettings {
    pub fn new(branch_root: impl Into<String>, trunk_url: impl Into<String>) -> Self {
        Self {
            branch_root: branch_root.into(),
            trunk_url: trunk_url.into(),
            scratch_dir: None,
            conflict_marker: DEFAULT_CONFLICT_MARKER.to_string(),
            commit_message: DEFAULT_REFRESH_MESSAGE.to_string(),
        }
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(scratch_dir.into());
        self
    }

    pub fn branch_url(&self, branch: &str) -> String {
        format!("{}/{}", self.branch_root.trim_end_matches('/'), branch)
    }
}

impl From<&SvnConfig> for RefreshSettings {
    fn from(config: &SvnConfig) -> Self {
        Self {
            branch_root: config.branch_url.clone(),
            trunk_url: config.trunk_url.clone(),
            scratch_dir: config.scratch_dir.clone(),
            conflict_marker: config.conflict_marker.clone(),
            commit_message: config.refresh_message.clone(),
        }
    }
}

/// Transcripts of a completed checkout-merge-commit sequence.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub branch: BranchName,
    pub checkout: Transcript,
    pub merge: Transcript,
    pub commit: Transcript,
}

/// One checkout-merge-commit run in a scratch directory.
pub(crate) struct ScratchMerge<'a> {
    pub branch: &'a str,
    pub checkout_url: &'a str,
    pub merge_url: &'a str,
    pub mode: MergeMode,
    pub message: &'a str,
}

impl ScratchMerge<'_> {
    /// Run the merge and release the scratch directory on every path.
    pub(crate) async fn run(
        &self,
        vcs: &dyn VersionControl,
        settings: &RefreshSettings,
    ) -> Result<MergeReport, RefreshError> {
        enter(RefreshStage::AcquireWorkdir, self.branch);
        let workdir =
            ScratchWorkdir::acquire(settings.scratch_dir.as_deref()).map_err(RefreshError::Workdir)?;

        let outcome = self.run_in(vcs, settings, workdir.path()).await;

        enter(RefreshStage::Cleanup, self.branch);
        let released = workdir.release();

        if released.is_err() {
            // release already logged the error
            warn!(branch = self.branch, "scratch working directory left behind");
        }
        outcome
    }

    async fn run_in(
        &self,
        vcs: &dyn VersionControl,
        settings: &RefreshSettings,
        working_dir: &Path,
    ) -> Result<MergeReport, RefreshError> {
        enter(RefreshStage::Checkout, self.branch);
        let checkout = vcs
            .checkout(self.checkout_url, working_dir)
            .await
            .map_err(|source| RefreshError::Checkout {
                url: self.checkout_url.to_string(),
                source,
            })?;

        enter(RefreshStage::Merge, self.branch);
        let merge = vcs
            .merge(self.merge_url, working_dir, self.mode)
            .await
            .map_err(|source| RefreshError::Merge {
                branch: self.branch.to_string(),
                source,
            })?;

        enter(RefreshStage::ClassifyMerge, self.branch);
        if has_conflicts(&merge, &settings.conflict_marker) {
            warn!(branch = self.branch, "merge left conflicts, not committing");
            return Err(RefreshError::MergeConflict {
                branch: self.branch.to_string(),
                transcript: merge,
            });
        }

        enter(RefreshStage::Commit, self.branch);
        let commit = vcs
            .commit(working_dir, self.message)
            .await
            .map_err(|source| RefreshError::Commit {
                branch: self.branch.to_string(),
                source,
            })?;

        Ok(MergeReport {
            branch: self.branch.to_string(),
            checkout,
            merge,
            commit,
        })
    }
}

fn enter(stage: RefreshStage, branch: &str) {
    info!(%stage, branch, "refresh stage");
}

/// Synchronizes ticket branches with trunk.
pub struct RefreshOrchestrator<'a> {
    vcs: &'a dyn VersionControl,
    settings: &'a RefreshSettings,
}

impl<'a> RefreshOrchestrator<'a> {
    pub fn new(vcs: &'a dyn VersionControl, settings: &'a RefreshSettings) -> Self {
        Self { vcs, settings }
    }

    /// Merge trunk into the branch for `ticket` and commit the result.
    pub async fn refresh(&self, ticket: &str) -> Result<MergeReport, RefreshError> {
        enter(RefreshStage::ResolveBranch, ticket);
        let branch = BranchResolver::new(self.vcs, &self.settings.branch_root)
            .resolve(ticket)
            .await?;
        let branch_url = self.settings.branch_url(&branch);

        ScratchMerge {
            branch: &branch,
            checkout_url: &branch_url,
            merge_url: &self.settings.trunk_url,
            mode: MergeMode::Postpone,
            message: &self.settings.commit_message,
        }
        .run(self.vcs, self.settings)
        .await
    }
}
