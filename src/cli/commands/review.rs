use crate::crucible::ReviewSystem;
use crate::external::VersionControl;
use crate::jira::{status, IssueTracker};
use crate::workflows::{reintegrate, BranchResolver, RefreshSettings};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::{info, warn};

/// Opens a review of a ticket's branch against trunk.
pub struct StartReviewCommand<'a> {
    pub ticket: &'a str,
    pub persons: Vec<String>,
    pub open_browser: bool,
}

impl<'a> StartReviewCommand<'a> {
    pub fn new(ticket: &'a str, persons: Vec<String>) -> Self {
        Self {
            ticket,
            persons,
            open_browser: false,
        }
    }

    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub async fn execute(
        &self,
        tracker: &dyn IssueTracker,
        reviews: &dyn ReviewSystem,
        vcs: &dyn VersionControl,
        settings: &RefreshSettings,
        out: &mut dyn Write,
    ) -> Result<()> {
        let issue = tracker.get_issue(self.ticket).await?;
        let branch = BranchResolver::new(vcs, &settings.branch_root)
            .resolve(&issue.key)
            .await?;

        let offered = tracker.transitions(&issue.key).await?;
        if offered.iter().any(|t| t.name == status::IN_REVIEW) {
            writeln!(out, "Marking issue {} as \"{}\"", issue.key, status::IN_REVIEW)?;
            tracker.transition_issue(&issue.key, status::IN_REVIEW).await?;
        }

        let review = reviews
            .create_review(&self.persons, &issue.key)
            .await
            .context("failed to create review")?;
        let review_id = review.id().to_string();

        if let Err(err) = self
            .populate(reviews, vcs, settings, &branch, &review_id)
            .await
        {
            warn!(review_id = %review_id, error = %err, "abandoning draft review");
            if let Err(abandon) = reviews.abandon_review(&review_id).await {
                warn!(review_id = %review_id, error = %abandon, "failed to abandon draft review");
            }
            return Err(err);
        }

        match reviews.reviewers(&review_id).await {
            Ok(names) if !names.is_empty() => writeln!(out, "Reviewers: {}", names.join(", "))?,
            Ok(_) => writeln!(out, "No reviewers assigned")?,
            Err(err) => warn!(review_id = %review_id, error = %err, "unable to list reviewers"),
        }

        if self.open_browser {
            let url = reviews.frontend_url(&review_id);
            writeln!(out, "Opening {url}")?;
            if let Err(err) = open::that(&url) {
                warn!(%url, error = %err, "unable to open browser");
            }
        }

        writeln!(out, "Created review {review_id} for ticket {}", issue.key)?;
        Ok(())
    }

    async fn populate(
        &self,
        reviews: &dyn ReviewSystem,
        vcs: &dyn VersionControl,
        settings: &RefreshSettings,
        branch: &str,
        review_id: &str,
    ) -> Result<()> {
        let patch = vcs
            .diff(&settings.trunk_url, &settings.branch_url(branch))
            .await
            .with_context(|| format!("failed to diff {branch} against trunk"))?;
        reviews
            .add_patch(review_id, &patch)
            .await
            .context("failed to upload patch")?;
        reviews
            .start_review(review_id)
            .await
            .context("failed to start review")?;
        info!(review_id, branch, "review started");
        Ok(())
    }
}

/// Close the ticket's review, then reintegrate its branch into trunk.
///
/// The branch is resolved first so an ambiguous ticket never closes a review.
pub async fn finish_review(
    tracker: &dyn IssueTracker,
    reviews: &dyn ReviewSystem,
    vcs: &dyn VersionControl,
    settings: &RefreshSettings,
    ticket: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let issue = tracker.get_issue(ticket).await?;
    let branch = BranchResolver::new(vcs, &settings.branch_root)
        .resolve(&issue.key)
        .await?;

    let review = reviews.review_for_issue(&issue.key).await?;
    reviews
        .finish_review(review.id())
        .await
        .with_context(|| format!("failed to close review {review}"))?;
    writeln!(out, "Closed review {review}")?;

    writeln!(out, "🔀 Reintegrating {branch} into trunk")?;
    let report = reintegrate(vcs, settings, &branch).await?;
    for transcript in [
        &report.merge.checkout,
        &report.merge.merge,
        &report.merge.commit,
        &report.delete,
    ] {
        writeln!(out, "{transcript}")?;
    }
    writeln!(out, "✅ {branch} reintegrated into trunk")?;

    Ok(())
}
