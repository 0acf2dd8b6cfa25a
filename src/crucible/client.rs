use super::errors::CrucibleError;
use super::types::{Review, ReviewAction, ReviewList, ReviewerList};
use crate::config::CrucibleConfig;
use crate::http::{HttpConfig, RateLimitedHttpClient, RequestBody};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};

const REVIEWS: &str = "rest-service/reviews-v1";
const SEARCH: &str = "rest-service/search-v1";

/// Trait for code-review operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewSystem: Send + Sync {
    /// Create a draft review linked to `jira_key`, with `participants` as reviewers.
    async fn create_review(
        &self,
        participants: &[String],
        jira_key: &str,
    ) -> Result<Review, CrucibleError>;

    async fn add_patch(&self, review_id: &str, patch: &str) -> Result<(), CrucibleError>;

    async fn start_review(&self, review_id: &str) -> Result<(), CrucibleError>;

    /// Summarize and close the review.
    async fn finish_review(&self, review_id: &str) -> Result<(), CrucibleError>;

    async fn abandon_review(&self, review_id: &str) -> Result<(), CrucibleError>;

    async fn reviewers(&self, review_id: &str) -> Result<Vec<String>, CrucibleError>;

    /// The open review linked to a Jira issue.
    async fn review_for_issue(&self, jira_key: &str) -> Result<Review, CrucibleError>;

    /// Browser URL for a review.
    fn frontend_url(&self, review_id: &str) -> String;
}

/// Crucible REST client
#[derive(Debug, Clone)]
pub struct CrucibleClient {
    http: RateLimitedHttpClient,
    project_key: String,
}

impl CrucibleClient {
    pub fn new(config: &CrucibleConfig, http: &HttpConfig) -> Result<Self, CrucibleError> {
        let http = RateLimitedHttpClient::new(
            &config.server,
            &config.username,
            &config.password,
            http,
        )?;
        Ok(Self {
            http,
            project_key: config.key.clone(),
        })
    }

    /// Payload for a new review. The creator is never listed as a reviewer.
    pub fn review_payload(
        creator: &str,
        project_key: &str,
        participants: &[String],
        jira_key: Option<&str>,
    ) -> Value {
        let user = json!({ "userName": creator });
        let reviewers: Vec<Value> = participants
            .iter()
            .filter(|p| p.as_str() != creator)
            .map(|p| json!({ "userName": p, "completed": false }))
            .collect();
        let name = match jira_key {
            Some(key) => format!("Review for {key}"),
            None => "Review".to_string(),
        };

        let mut payload = json!({
            "reviewData": {
                "allowReviewersToJoin": true,
                "creator": user,
                "author": user,
                "moderator": user,
                "projectKey": project_key,
                "name": name,
                "type": "REVIEW",
            },
            "detailedReviewData": {
                "reviewers": { "reviewer": reviewers },
            },
        });
        if let Some(key) = jira_key {
            payload["reviewData"]["jiraIssueKey"] = json!(key);
        }
        payload
    }

    async fn transition(&self, review_id: &str, action: ReviewAction) -> Result<(), CrucibleError> {
        debug!(review_id, action = action.as_str(), "transitioning review");
        self.http
            .send(
                Method::POST,
                &format!("{REVIEWS}/{review_id}/transition"),
                &[("action", action.as_str())],
                None,
                StatusCode::OK,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewSystem for CrucibleClient {
    async fn create_review(
        &self,
        participants: &[String],
        jira_key: &str,
    ) -> Result<Review, CrucibleError> {
        let payload = Self::review_payload(
            self.http.username(),
            &self.project_key,
            participants,
            Some(jira_key),
        );
        let review: Review = self
            .http
            .json(
                Method::POST,
                REVIEWS,
                &[],
                Some(RequestBody::Json(payload)),
                StatusCode::CREATED,
            )
            .await?;

        info!(review_id = review.id(), "created review");
        Ok(review)
    }

    async fn add_patch(&self, review_id: &str, patch: &str) -> Result<(), CrucibleError> {
        self.http
            .send(
                Method::POST,
                &format!("{REVIEWS}/{review_id}/patch"),
                &[],
                Some(RequestBody::Json(json!({ "patch": patch }))),
                StatusCode::OK,
            )
            .await?;
        Ok(())
    }

    async fn start_review(&self, review_id: &str) -> Result<(), CrucibleError> {
        self.transition(review_id, ReviewAction::Approve).await
    }

    async fn finish_review(&self, review_id: &str) -> Result<(), CrucibleError> {
        self.transition(review_id, ReviewAction::Summarize).await?;
        self.transition(review_id, ReviewAction::Close).await
    }

    async fn abandon_review(&self, review_id: &str) -> Result<(), CrucibleError> {
        self.transition(review_id, ReviewAction::Abandon).await
    }

    async fn reviewers(&self, review_id: &str) -> Result<Vec<String>, CrucibleError> {
        let list: ReviewerList = self
            .http
            .get(&format!("{REVIEWS}/{review_id}/reviewers"), &[])
            .await?;
        Ok(list.reviewer.into_iter().map(|r| r.user_name).collect())
    }

    async fn review_for_issue(&self, jira_key: &str) -> Result<Review, CrucibleError> {
        let list: ReviewList = self
            .http
            .get(&format!("{SEARCH}/reviewsForIssue"), &[("jiraKey", jira_key)])
            .await?;
        list.reviews
            .into_iter()
            .find(Review::is_open)
            .ok_or_else(|| CrucibleError::NoReviewForIssue(jira_key.to_string()))
    }

    fn frontend_url(&self, review_id: &str) -> String {
        self.http.url(&format!("cru/{review_id}"))
    }
}
