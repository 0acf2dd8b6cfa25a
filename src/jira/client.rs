use super::errors::JiraError;
use super::types::{
    CreatedIssue, Filter, Issue, IssueKind, SearchResults, Transition, TransitionList, User,
};
use crate::config::{JiraConfig, JiraQueryConfig};
use crate::http::{HttpConfig, HttpError, RateLimitedHttpClient, RequestBody};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::{debug, info};

const API: &str = "rest/api/2";
const ISSUE_FIELDS: &str = "summary,status";

/// Trait for issue-tracker operations
///
/// Commands talk to the tracker only through this trait so they can be
/// exercised against a mock.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_issue(&self, ticket: &str) -> Result<Issue, JiraError>;

    /// Create an issue in the configured project, assigned to the configured user.
    async fn create_issue(
        &self,
        summary: &str,
        description: &str,
        kind: IssueKind,
    ) -> Result<String, JiraError>;

    async fn transitions(&self, ticket: &str) -> Result<Vec<Transition>, JiraError>;

    /// Move the issue through the transition named `status`.
    ///
    /// Fails with `InvalidTransition` when the tracker does not offer it.
    async fn transition_issue(&self, ticket: &str, status: &str) -> Result<(), JiraError>;

    async fn add_comment(&self, ticket: &str, body: &str) -> Result<(), JiraError>;

    async fn add_watcher(&self, ticket: &str, person: &str) -> Result<(), JiraError>;

    async fn assign_issue(&self, ticket: &str, assignee: &str) -> Result<(), JiraError>;

    async fn search(&self, jql: &str) -> Result<Vec<Issue>, JiraError>;

    async fn favourite_filters(&self) -> Result<Vec<Filter>, JiraError>;

    async fn assignable_users(&self) -> Result<Vec<String>, JiraError>;
}

/// Jira REST v2 client
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: RateLimitedHttpClient,
    project: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, http: &HttpConfig) -> Result<Self, JiraError> {
        let http = RateLimitedHttpClient::new(
            &config.server,
            &config.username,
            &config.password,
            http,
        )?;
        Ok(Self {
            http,
            project: config.project.clone(),
        })
    }

    fn issue_path(ticket: &str, rest: &str) -> String {
        format!("{API}/issue/{ticket}{rest}")
    }
}

fn not_found_as(ticket: &str, err: HttpError) -> JiraError {
    match err.status() {
        Some(404) => JiraError::IssueNotFound(ticket.to_string()),
        _ => JiraError::Http(err),
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn get_issue(&self, ticket: &str) -> Result<Issue, JiraError> {
        self.http
            .get(&Self::issue_path(ticket, ""), &[("fields", ISSUE_FIELDS)])
            .await
            .map_err(|e| not_found_as(ticket, e))
    }

    async fn create_issue(
        &self,
        summary: &str,
        description: &str,
        kind: IssueKind,
    ) -> Result<String, JiraError> {
        let payload = json!({
            "fields": {
                "project": {"key": self.project},
                "summary": summary,
                "description": description,
                "assignee": {"name": self.http.username()},
                "issuetype": {"name": kind.as_str()},
            }
        });
        let created: CreatedIssue = self
            .http
            .json(
                Method::POST,
                &format!("{API}/issue"),
                &[],
                Some(RequestBody::Json(payload)),
                StatusCode::CREATED,
            )
            .await?;

        info!(key = %created.key, kind = kind.as_str(), "created issue");
        Ok(created.key)
    }

    async fn transitions(&self, ticket: &str) -> Result<Vec<Transition>, JiraError> {
        let list: TransitionList = self
            .http
            .get(&Self::issue_path(ticket, "/transitions"), &[])
            .await
            .map_err(|e| not_found_as(ticket, e))?;
        Ok(list.transitions)
    }

    async fn transition_issue(&self, ticket: &str, status: &str) -> Result<(), JiraError> {
        let transitions = self.transitions(ticket).await?;
        let Some(transition) = transitions.iter().find(|t| t.name == status) else {
            return Err(JiraError::InvalidTransition {
                ticket: ticket.to_string(),
                status: status.to_string(),
                valid: transitions.into_iter().map(|t| t.name).collect(),
            });
        };

        debug!(ticket, status, id = %transition.id, "transitioning issue");
        self.http
            .send(
                Method::POST,
                &Self::issue_path(ticket, "/transitions"),
                &[],
                Some(RequestBody::Json(json!({"transition": {"id": transition.id}}))),
                StatusCode::NO_CONTENT,
            )
            .await?;
        Ok(())
    }

    async fn add_comment(&self, ticket: &str, body: &str) -> Result<(), JiraError> {
        self.http
            .send(
                Method::POST,
                &Self::issue_path(ticket, "/comment"),
                &[],
                Some(RequestBody::Json(json!({ "body": body }))),
                StatusCode::CREATED,
            )
            .await
            .map_err(|e| not_found_as(ticket, e))?;
        Ok(())
    }

    async fn add_watcher(&self, ticket: &str, person: &str) -> Result<(), JiraError> {
        self.http
            .send(
                Method::POST,
                &Self::issue_path(ticket, "/watchers"),
                &[],
                Some(RequestBody::Json(json!(person))),
                StatusCode::NO_CONTENT,
            )
            .await
            .map_err(|e| not_found_as(ticket, e))?;
        Ok(())
    }

    async fn assign_issue(&self, ticket: &str, assignee: &str) -> Result<(), JiraError> {
        self.http
            .send(
                Method::PUT,
                &Self::issue_path(ticket, "/assignee"),
                &[],
                Some(RequestBody::Json(json!({ "name": assignee }))),
                StatusCode::NO_CONTENT,
            )
            .await
            .map_err(|e| not_found_as(ticket, e))?;
        Ok(())
    }

    async fn search(&self, jql: &str) -> Result<Vec<Issue>, JiraError> {
        let results: SearchResults = self
            .http
            .json(
                Method::POST,
                &format!("{API}/search"),
                &[],
                Some(RequestBody::Json(json!({
                    "jql": jql,
                    "fields": ["summary"],
                }))),
                StatusCode::OK,
            )
            .await?;
        Ok(results.issues)
    }

    async fn favourite_filters(&self) -> Result<Vec<Filter>, JiraError> {
        Ok(self.http.get(&format!("{API}/filter/favourite"), &[]).await?)
    }

    async fn assignable_users(&self) -> Result<Vec<String>, JiraError> {
        let users: Vec<User> = self
            .http
            .get(
                &format!("{API}/user/assignable/multiProjectSearch"),
                &[
                    ("username", ""),
                    ("projectKeys", self.project.as_str()),
                    ("maxResults", "500"),
                ],
            )
            .await?;
        Ok(users.into_iter().map(|u| u.name).collect())
    }
}

/// Run the query configured for a listing: explicit JQL first, then a named
/// favourite filter, then `default_jql`.
pub async fn run_configured_query(
    tracker: &dyn IssueTracker,
    query: &JiraQueryConfig,
    default_jql: &str,
) -> Result<Vec<Issue>, JiraError> {
    if let Some(jql) = &query.jql {
        return tracker.search(jql).await;
    }

    if let Some(name) = &query.filter {
        let filters = tracker.favourite_filters().await?;
        let filter = filters
            .into_iter()
            .find(|f| &f.name == name)
            .ok_or_else(|| JiraError::FilterNotFound(name.clone()))?;
        return tracker.search(&filter.jql).await;
    }

    tracker.search(default_jql).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn issue(key: &str, summary: &str) -> Issue {
        serde_json::from_value(json!({"key": key, "fields": {"summary": summary}})).unwrap()
    }

    #[tokio::test]
    async fn test_configured_jql_wins() {
        let mut tracker = MockIssueTracker::new();
        tracker
            .expect_search()
            .with(eq("project = X"))
            .times(1)
            .returning(|_| Ok(vec![issue("X-1", "one")]));
        tracker.expect_favourite_filters().never();

        let query = JiraQueryConfig {
            jql: Some("project = X".to_string()),
            filter: Some("ignored".to_string()),
        };
        let issues = run_configured_query(&tracker, &query, "default").await.unwrap();

        assert_eq!(issues, vec![issue("X-1", "one")]);
    }

    #[tokio::test]
    async fn test_named_filter_is_looked_up() {
        let mut tracker = MockIssueTracker::new();
        tracker.expect_favourite_filters().returning(|| {
            Ok(vec![Filter {
                name: "assigned to me".to_string(),
                jql: "assignee = currentUser()".to_string(),
            }])
        });
        tracker
            .expect_search()
            .with(eq("assignee = currentUser()"))
            .returning(|_| Ok(vec![]));

        let query = JiraQueryConfig {
            jql: None,
            filter: Some("assigned to me".to_string()),
        };
        assert!(run_configured_query(&tracker, &query, "default")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_filter_is_an_error() {
        let mut tracker = MockIssueTracker::new();
        tracker.expect_favourite_filters().returning(|| Ok(vec![]));

        let query = JiraQueryConfig {
            jql: None,
            filter: Some("missing".to_string()),
        };
        let err = run_configured_query(&tracker, &query, "default")
            .await
            .unwrap_err();

        assert!(matches!(err, JiraError::FilterNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_default_jql_used_when_nothing_configured() {
        let mut tracker = MockIssueTracker::new();
        tracker
            .expect_search()
            .with(eq("status = Open"))
            .returning(|_| Ok(vec![]));

        run_configured_query(&tracker, &JiraQueryConfig::default(), "status = Open")
            .await
            .unwrap();
    }
}
