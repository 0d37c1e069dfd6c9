use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use thiserror::Error;
use tracing::debug;

/// Failure below the HTTP status level
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("invalid request: {0}")]
    Build(String),

    #[error("HTTP transport error: {0}")]
    Other(String),
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::Build(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }

    /// Whether the request may not have reached the server
    pub fn is_connection_level(&self) -> bool {
        !matches!(self, Self::Build(_))
    }
}

/// Status and body text of a completed exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport with a request timeout.
///
/// Performs exactly one exchange per [`send`](Self::send); retrying is the
/// caller's job.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request and buffer the response body as text.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<HttpResponse, TransportError> {
        let request =
            builder.build().map_err(|err| TransportError::from_reqwest(err, self.timeout))?;

        let method = request.method().clone();
        // Logged without the query string, which may carry cursors or filters.
        let path = request.url().path().to_string();
        debug!(%method, %path, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, %path, error = %err, "HTTP request failed");
            TransportError::from_reqwest(err, self.timeout)
        })?;

        let status = response.status().as_u16();
        let body =
            response.text().await.map_err(|err| TransportError::from_reqwest(err, self.timeout))?;

        debug!(%method, %path, status, bytes = body.len(), "received HTTP response");
        Ok(HttpResponse { status, body })
    }
}

/// Sent with every request
pub const USER_AGENT: &str = concat!("adreach/", env!("CARGO_PKG_VERSION"));

/// Builder for [`HttpClient`].
///
/// Proxies come from the environment (`HTTPS_PROXY`, `HTTP_PROXY`,
/// `NO_PROXY`) as reqwest reads them.
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| TransportError::Build(err.to_string()))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
