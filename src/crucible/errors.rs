use crate::http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrucibleError {
    #[error("no open review is linked to {0}")]
    NoReviewForIssue(String),
    #[error("review setup failed while communicating with Crucible: {0}")]
    Http(#[from] HttpError),
}
