//! HTTP client trait and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

use super::charset;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch HTML content from a URL, transcoded to UTF-8.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch binary content from a URL.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Configuration for [`WebClient`].
#[derive(Clone)]
pub struct WebClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for WebClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (compatible; Wally/1.0)".to_string(),
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn build(self) -> Result<WebClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(WebClient { inner })
    }
}

/// Production HTTP client over reqwest. One timeout-bounded attempt per
/// call; the next scheduled trigger is the retry mechanism.
pub struct WebClient {
    inner: reqwest::Client,
}

impl WebClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        WebClientBuilder::new().build()
    }

    pub fn builder() -> WebClientBuilder {
        WebClientBuilder::new()
    }

    async fn get(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url, "fetching");
        let response = self.inner.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = %status, "request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!(url, len = bytes.len(), "fetched successfully");
        Ok((bytes, content_type))
    }
}

#[async_trait]
impl HttpClient for WebClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let (bytes, content_type) = self.get(url).await?;
        Ok(charset::decode_bytes_to_utf8(&bytes, content_type.as_deref()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.get(url).await?.0)
    }
}

/// Canned response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Html(String),
    Bytes(Vec<u8>),
    Status(u16),
    Error(String),
}

/// Mock HTTP client for testing.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    /// Create a new empty mock client. Unknown URLs fail like an
    /// unreachable host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Add an HTML response for a URL.
    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with_response(url, MockResponse::Html(html.to_string()))
    }

    /// Add a bytes response for a URL.
    pub fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
        self.with_response(url, MockResponse::Bytes(bytes))
    }

    /// Add an HTTP error status for a URL.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    /// Add a transport-level error for a URL.
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }

    fn lookup(&self, url: &str) -> Result<&MockResponse, FetchError> {
        match self.responses.get(url) {
            Some(MockResponse::Status(code)) => Err(FetchError::Status(*code)),
            Some(MockResponse::Error(e)) => Err(FetchError::Transport(e.clone())),
            Some(other) => Ok(other),
            None => Err(FetchError::Transport(format!(
                "no mock response for URL: {}",
                url
            ))),
        }
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        match self.lookup(url)? {
            MockResponse::Html(html) => Ok(html.clone()),
            MockResponse::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            _ => unreachable!("lookup filters status and error responses"),
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.lookup(url)? {
            MockResponse::Html(html) => Ok(html.as_bytes().to_vec()),
            MockResponse::Bytes(bytes) => Ok(bytes.clone()),
            _ => unreachable!("lookup filters status and error responses"),
        }
    }
}
