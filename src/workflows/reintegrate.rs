//! Reintegration: fold a reviewed branch back into trunk and retire it.

use super::refresh::{MergeReport, RefreshError, RefreshSettings, ScratchMerge};
use crate::external::svn::{MergeMode, Transcript, VcsError, VersionControl};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReintegrateError {
    #[error(transparent)]
    Merge(#[from] RefreshError),
    #[error("branch {branch} was reintegrated but could not be deleted: {source}")]
    DeleteBranch {
        branch: String,
        #[source]
        source: VcsError,
    },
}

#[derive(Debug, Clone)]
pub struct ReintegrateReport {
    pub merge: MergeReport,
    pub delete: Transcript,
}

/// Merge an already resolved `branch` into trunk, commit, then delete the branch.
///
/// The branch is only deleted after trunk has the committed merge.
pub async fn reintegrate(
    vcs: &dyn VersionControl,
    settings: &RefreshSettings,
    branch: &str,
) -> Result<ReintegrateReport, ReintegrateError> {
    let branch_url = settings.branch_url(branch);
    let message = format!("reintegrated {branch} into trunk");

    let merge = ScratchMerge {
        branch,
        checkout_url: &settings.trunk_url,
        merge_url: &branch_url,
        mode: MergeMode::Reintegrate,
        message: &message,
    }
    .run(vcs, settings)
    .await?;

    info!(branch = %branch, "deleting reintegrated branch");
    let delete = vcs
        .delete(&branch_url, &format!("removing reintegrated branch {branch}"))
        .await
        .map_err(|source| ReintegrateError::DeleteBranch {
            branch: branch.to_string(),
            source,
        })?;

    Ok(ReintegrateReport { merge, delete })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::refresh::tests::FakeVcs;

    #[tokio::test]
    async fn test_reintegrate_merges_into_trunk_then_deletes() {
        let root = tempfile::tempdir().unwrap();
        let vcs = FakeVcs::new(&["PROJ-7_fix", "PROJ-8_other"]);
        let settings = RefreshSettings::new("file:///repo/branches", "file:///repo/trunk")
            .with_scratch_dir(root.path());

        let report = reintegrate(&vcs, &settings, "PROJ-7_fix").await.unwrap();

        assert_eq!(report.merge.branch, "PROJ-7_fix");
        assert_eq!(report.delete.output, "Committed revision 9.\n");
        assert_eq!(
            vcs.calls(),
            vec![
                "checkout file:///repo/trunk",
                "merge file:///repo/branches/PROJ-7_fix Reintegrate",
                "commit reintegrated PROJ-7_fix into trunk",
                "delete file:///repo/branches/PROJ-7_fix",
            ]
        );
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_branch_deleted_even_if_scratch_cleanup_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut vcs = FakeVcs::new(&["PROJ-7_fix"]);
        vcs.remove_workdir_on_commit = true;
        let settings = RefreshSettings::new("file:///repo/branches", "file:///repo/trunk")
            .with_scratch_dir(root.path());

        let report = reintegrate(&vcs, &settings, "PROJ-7_fix").await.unwrap();

        assert_eq!(report.delete.command, "svn delete");
        assert_eq!(
            vcs.calls().last().map(String::as_str),
            Some("delete file:///repo/branches/PROJ-7_fix")
        );
    }

    #[tokio::test]
    async fn test_conflicted_reintegration_keeps_branch() {
        let root = tempfile::tempdir().unwrap();
        let mut vcs = FakeVcs::new(&["PROJ-7_fix"]);
        vcs.merge_output = "C    file.txt\nSummary of conflicts:\n".to_string();
        let settings = RefreshSettings::new("file:///repo/branches", "file:///repo/trunk")
            .with_scratch_dir(root.path());

        let err = reintegrate(&vcs, &settings, "PROJ-7_fix").await.unwrap_err();

        assert!(matches!(
            err,
            ReintegrateError::Merge(RefreshError::MergeConflict { .. })
        ));
        assert!(!vcs.calls().iter().any(|c| c.starts_with("delete")));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
