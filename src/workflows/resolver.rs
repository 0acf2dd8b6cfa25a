//! Branch resolution: map a ticket token to the single branch that carries it.

use crate::external::svn::{normalize_branch_name, BranchName, VcsError, VersionControl};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("branch search token must not be empty")]
    EmptyToken,
    #[error("no branch matches \"{token}\"")]
    NotFound { token: String },
    #[error("more than one branch matches \"{token}\": {}", candidates.join(", "))]
    Ambiguous {
        token: String,
        candidates: Vec<BranchName>,
    },
    #[error("unable to list branches: {0}")]
    Listing(#[from] VcsError),
}

/// Pick the one branch whose normalized name contains `token`.
pub fn select_unique_branch<S: AsRef<str>>(
    branches: &[S],
    token: &str,
) -> Result<BranchName, ResolveError> {
    if token.trim().is_empty() {
        return Err(ResolveError::EmptyToken);
    }

    let mut candidates: Vec<BranchName> = branches
        .iter()
        .map(|b| normalize_branch_name(b.as_ref()))
        .filter(|name| name.contains(token))
        .map(str::to_string)
        .collect();

    match candidates.len() {
        0 => Err(ResolveError::NotFound {
            token: token.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(ResolveError::Ambiguous {
            token: token.to_string(),
            candidates,
        }),
    }
}

/// Resolves search tokens against the branches listed under one branch root.
pub struct BranchResolver<'a> {
    vcs: &'a dyn VersionControl,
    branch_root: &'a str,
}

impl<'a> BranchResolver<'a> {
    pub fn new(vcs: &'a dyn VersionControl, branch_root: &'a str) -> Self {
        Self { vcs, branch_root }
    }

    pub async fn resolve(&self, token: &str) -> Result<BranchName, ResolveError> {
        if token.trim().is_empty() {
            return Err(ResolveError::EmptyToken);
        }

        let branches = self.vcs.list_branches(self.branch_root).await?;
        debug!(
            branch_root = self.branch_root,
            count = branches.len(),
            token,
            "listed branches"
        );
        select_unique_branch(branches.as_slice(), token)
    }
}
