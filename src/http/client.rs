use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Connection settings shared by the Atlassian REST clients
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Upper bound on requests per second to one server
    pub requests_per_second: u32,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("unable to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {url}: expected status {expected}, received {actual}")]
    UnexpectedStatus {
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },
    #[error("unable to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    /// HTTP status of the response, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

/// Request payloads accepted by the Atlassian services
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
}

/// Rate-limited HTTP client with basic authentication against one server
#[derive(Debug, Clone)]
pub struct RateLimitedHttpClient {
    client: reqwest::Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
    username: String,
    password: String,
}

impl RateLimitedHttpClient {
    /// Create a new rate-limited HTTP client
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        settings: &HttpConfig,
    ) -> Result<Self, HttpError> {
        let per_second = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            rate_limiter,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the raw response body.
    ///
    /// Any status other than `expected` is an error.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<RequestBody>,
        expected: StatusCode,
    ) -> Result<String, HttpError> {
        let url = self.url(path);

        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        debug!(%method, %url, ?query, "sending request");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Text(text)) => request
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(text),
            None => request,
        };

        let response = request.send().await.map_err(|source| HttpError::Request {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| HttpError::Request {
            url: url.clone(),
            source,
        })?;

        debug!(%url, status = status.as_u16(), "received response");

        if status != expected {
            return Err(HttpError::UnexpectedStatus {
                url,
                expected: expected.as_u16(),
                actual: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    /// Send a request and decode a JSON response.
    pub async fn json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<RequestBody>,
        expected: StatusCode,
    ) -> Result<T, HttpError> {
        let text = self.send(method, path, query, body, expected).await?;
        serde_json::from_str(&text).map_err(|source| HttpError::Decode {
            url: self.url(path),
            source,
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        self.json(Method::GET, path, query, None, StatusCode::OK).await
    }
}
