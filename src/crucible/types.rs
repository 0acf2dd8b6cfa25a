use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PermaId {
    pub id: String,
}

/// Review summary as returned by `reviews-v1`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub perma_id: PermaId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

impl Review {
    pub fn id(&self) -> &str {
        &self.perma_id.id
    }

    /// Closed and abandoned reviews can no longer be finished.
    pub fn is_open(&self) -> bool {
        !matches!(self.state.as_str(), "Closed" | "Dead" | "Rejected")
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewList {
    #[serde(rename = "reviewData", default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Reviewer {
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewerList {
    #[serde(default)]
    pub reviewer: Vec<Reviewer>,
}

/// Review workflow actions understood by the transition endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Summarize,
    Close,
    Abandon,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "action:approveReview",
            ReviewAction::Summarize => "action:summarizeReview",
            ReviewAction::Close => "action:closeReview",
            ReviewAction::Abandon => "action:abandonReview",
        }
    }
}
