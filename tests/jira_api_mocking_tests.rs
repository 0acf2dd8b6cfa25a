//! Jira REST mocking tests
//!
//! These tests run the real `JiraClient` against a wiremock server standing in
//! for Jira, so request shapes and error mapping are checked without a network.

use air::config::{JiraConfig, JiraQueryConfig};
use air::http::HttpConfig;
use air::jira::{IssueKind, IssueTracker, JiraClient, JiraError};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Jira mock server plus a client pointed at it
pub struct JiraApiMock {
    pub server: MockServer,
    pub client: JiraClient,
}

impl JiraApiMock {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let config = JiraConfig {
            server: server.uri(),
            username: "first.last".to_string(),
            password: "secret".to_string(),
            project: "PROJ".to_string(),
            close_status: "Close Issue".to_string(),
            list: JiraQueryConfig::default(),
            review: JiraQueryConfig::default(),
        };
        let client = JiraClient::new(&config, &HttpConfig::default()).unwrap();
        Self { server, client }
    }

    /// Mock the transitions currently offered for `ticket`
    pub async fn mock_transitions(&self, ticket: &str, transitions: &[(&str, &str)]) {
        let list: Vec<_> = transitions
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/rest/api/2/issue/{ticket}/transitions")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"transitions": list})))
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn test_get_issue_reads_summary_and_status() {
    let mock = JiraApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/PROJ-1"))
        .and(basic_auth("first.last", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10001",
            "key": "PROJ-1",
            "fields": {"summary": "test bug", "status": {"name": "Open"}}
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let issue = mock.client.get_issue("PROJ-1").await.unwrap();

    assert_eq!(issue.key, "PROJ-1");
    assert_eq!(issue.summary(), "test bug");
}

#[tokio::test]
async fn test_missing_issue_maps_to_not_found() {
    let mock = JiraApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/PROJ-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errorMessages": ["Issue Does Not Exist"]
        })))
        .mount(&mock.server)
        .await;

    let err = mock.client.get_issue("PROJ-404").await.unwrap_err();

    assert!(matches!(err, JiraError::IssueNotFound(key) if key == "PROJ-404"));
}

#[tokio::test]
async fn test_transition_posts_matching_id() {
    let mock = JiraApiMock::new().await;
    mock.mock_transitions("PROJ-2", &[("11", "In Progress"), ("21", "Ready for Review")])
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/PROJ-2/transitions"))
        .and(body_json(json!({"transition": {"id": "21"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    mock.client
        .transition_issue("PROJ-2", "Ready for Review")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unoffered_transition_is_rejected_locally() {
    let mock = JiraApiMock::new().await;
    mock.mock_transitions("PROJ-3", &[("11", "In Progress")]).await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/PROJ-3/transitions"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock.server)
        .await;

    let err = mock
        .client
        .transition_issue("PROJ-3", "Reopen Issue")
        .await
        .unwrap_err();

    match err {
        JiraError::InvalidTransition { ticket, status, valid } => {
            assert_eq!(ticket, "PROJ-3");
            assert_eq!(status, "Reopen Issue");
            assert_eq!(valid, vec!["In Progress".to_string()]);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_issue_in_configured_project() {
    let mock = JiraApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue"))
        .and(body_partial_json(json!({
            "fields": {
                "project": {"key": "PROJ"},
                "summary": "test task",
                "assignee": {"name": "first.last"},
                "issuetype": {"name": "Task"}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10009",
            "key": "PROJ-9",
            "self": "https://jira.example.com/rest/api/2/issue/10009"
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let key = mock
        .client
        .create_issue("test task", "test task", IssueKind::Task)
        .await
        .unwrap();

    assert_eq!(key, "PROJ-9");
}

#[tokio::test]
async fn test_search_and_comment() {
    let mock = JiraApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/search"))
        .and(body_partial_json(json!({"jql": "project = PROJ"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "issues": [
                {"key": "PROJ-1", "fields": {"summary": "one"}},
                {"key": "PROJ-2", "fields": {"summary": "two"}}
            ]
        })))
        .mount(&mock.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/PROJ-1/comment"))
        .and(body_json(json!({"body": "Branch has been refreshed from trunk"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let issues = mock.client.search("project = PROJ").await.unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[1].summary(), "two");

    mock.client
        .add_comment("PROJ-1", "Branch has been refreshed from trunk")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock = JiraApiMock::new().await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/PROJ-5/assignee"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock.server)
        .await;

    let err = mock.client.assign_issue("PROJ-5", "ann").await.unwrap_err();

    assert!(matches!(err, JiraError::Http(_)));
}
