//! Graph API client with admission control and classified retries
//!
//! Every operation runs the same pipeline:
//!
//! 1. ask the [`AccessTokenProvider`] for a bearer token (an invalid
//!    credential fails immediately, without retrying)
//! 2. inside the retry loop, for every attempt:
//!    admit the call through the shared [`RateGate`], send it, and classify
//!    a non-success body into an [`ApiError`]
//! 3. decode the successful body
//!
//! The client holds no per-call state besides the gate's counters and is
//! safe to share between concurrent tool handlers.

use std::fmt;
use std::sync::Arc;

use adreach_common::resilience::{
    RateGate, RetryExecutor, RetryObserver, TracingRetryObserver,
};
use adreach_domain::{ApiError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::auth::{AccessTokenProvider, EnvTokenProvider};
use super::classifier::classify;
use super::guard::{ensure_mutations_allowed, MUTATIONS_DISABLED};
use super::policy::ApiRetryPolicy;
use crate::config::{self, ClientConfig};
use crate::errors::IntoApiError;
use crate::http::{HttpClient, HttpResponse};

/// A successful exchange and how many attempts it took
#[derive(Debug)]
pub(crate) struct Delivered {
    pub response: HttpResponse,
    pub attempts: u32,
    pub label: String,
}

/// API client with resilience patterns
pub struct ApiClient {
    http: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    gate: Arc<RateGate>,
    config: ClientConfig,
    reads: RetryExecutor<ApiRetryPolicy>,
    writes: RetryExecutor<ApiRetryPolicy>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with its own rate gate
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        Self::builder().config(config).auth(auth).build()
    }

    /// Load configuration from the environment or a config file and read
    /// the token from `META_ACCESS_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if no usable configuration is found.
    pub fn from_env() -> Result<Self> {
        let config = config::load().map_err(IntoApiError::into_api_error)?;
        Self::new(config, Arc::new(EnvTokenProvider::new()))
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Gate shared by every call this client makes
    pub fn rate_gate(&self) -> &Arc<RateGate> {
        &self.gate
    }

    /// `{graph_url}/{api_version}/{endpoint}`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.graph_url.trim_end_matches('/'),
            self.config.api_version.trim_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Fetch a single object.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] of the last attempt, with the
    /// attempt count and operation label attached.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let query = owned_params(params);
        let delivered = self.call(Method::GET, endpoint, &query, None, &self.reads).await?;
        let value = decode(&delivered)?;
        debug!(attempts = delivered.attempts, "request succeeded");
        Ok(value)
    }

    /// Create or update an object.
    ///
    /// Refused with a `Permission` error unless mutations are enabled.
    /// Server errors are not retried, since the write may have been applied.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] of the last attempt.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if let Err(err) = ensure_mutations_allowed(self.config.allow_mutations) {
            warn!("{MUTATIONS_DISABLED}");
            return Err(err.with_context(format!("POST {endpoint}"), 0));
        }

        let body = serde_json::to_value(body).map_err(|e| {
            ApiError::validation(format!("failed to serialize request body: {e}"))
        })?;

        let delivered = self.call(Method::POST, endpoint, &[], Some(&body), &self.writes).await?;
        let value = decode(&delivered)?;
        info!(attempts = delivered.attempts, "mutation applied");
        Ok(value)
    }

    pub(crate) fn read_executor(&self) -> &RetryExecutor<ApiRetryPolicy> {
        &self.reads
    }

    /// Authenticate once, then admit, send and classify under retry
    pub(crate) async fn call(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        executor: &RetryExecutor<ApiRetryPolicy>,
    ) -> Result<Delivered> {
        let label = format!("{method} {endpoint}");

        if !self.auth.is_valid().await {
            warn!(%label, "access token unavailable; not attempting call");
            return Err(ApiError::authentication("access token is missing or invalid")
                .with_context(label, 0));
        }
        let token = self.auth.access_token().await.map_err(|e| e.with_context(&label, 0))?;

        let url = self.endpoint_url(endpoint);
        let (url, token, method) = (url.as_str(), token.as_str(), &method);
        let scope = self.config.account_id.as_str();
        let tier = self.config.tier;

        let outcome = executor
            .execute_with_outcome(&label, || async move {
                self.gate.admit(scope, tier).map_err(IntoApiError::into_api_error)?;

                let mut builder =
                    self.http.request(method.clone(), url).bearer_auth(token).query(query);
                if let Some(body) = body {
                    builder = builder.json(body);
                }

                let response =
                    self.http.send(builder).await.map_err(IntoApiError::into_api_error)?;
                if response.is_success() {
                    Ok(response)
                } else {
                    let error = classify(&response.body, response.status);
                    debug!(kind = %error.kind, status = response.status, "call failed");
                    Err(error)
                }
            })
            .await;

        let attempts = outcome.attempts;
        let response = outcome.into_result().map_err(IntoApiError::into_api_error)?;
        Ok(Delivered { response, attempts, label })
    }
}

/// Decode a successful body; an empty body decodes as JSON `null`
pub(crate) fn decode<T: DeserializeOwned>(delivered: &Delivered) -> Result<T> {
    let body = delivered.response.body.trim();
    let parsed = if body.is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(body)
    };

    parsed.map_err(|e| {
        ApiError::protocol(
            format!("failed to decode response body: {e}"),
            Some(delivered.response.status),
        )
        .with_context(&delivered.label, delivered.attempts)
    })
}

pub(crate) fn owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    gate: Option<Arc<RateGate>>,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the authentication provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Share a rate gate with other clients in this process
    pub fn rate_gate(mut self, gate: Arc<RateGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the default tracing sink for retry events
    pub fn retry_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if required fields are missing, the
    /// configuration is invalid, or the HTTP client cannot be created.
    pub fn build(self) -> Result<ApiClient> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(IntoApiError::into_api_error)?;

        let auth =
            self.auth.ok_or_else(|| ApiError::validation("auth provider not set"))?;

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::validation(format!("failed to build HTTP client: {e}")))?;

        let observer = self.observer.unwrap_or_else(|| Arc::new(TracingRetryObserver));
        let backoff = config.retry.backoff();
        let reads = RetryExecutor::new(ApiRetryPolicy::reads())
            .with_backoff(backoff)
            .with_observer(Arc::clone(&observer));
        let writes = RetryExecutor::new(ApiRetryPolicy::mutations())
            .with_backoff(backoff)
            .with_observer(observer);

        debug!(
            account_id = %config.account_id,
            tier = %config.tier,
            api_version = %config.api_version,
            "API client ready"
        );

        Ok(ApiClient {
            http,
            auth,
            gate: self.gate.unwrap_or_else(|| Arc::new(RateGate::new())),
            config,
            reads,
            writes,
        })
    }
}

#[cfg(test)]
mod tests {
    use adreach_domain::ErrorKind;

    use super::*;
    use crate::api::auth::StaticTokenProvider;

    fn client(graph_url: &str, version: &str) -> ApiClient {
        let config = ClientConfig {
            graph_url: graph_url.to_string(),
            api_version: version.to_string(),
            ..ClientConfig::for_account("42")
        };
        ApiClient::new(config, Arc::new(StaticTokenProvider::new("t"))).unwrap()
    }

    #[test]
    fn test_endpoint_url_joins_segments() {
        let c = client("https://graph.facebook.com/", "v23.0");
        assert_eq!(
            c.endpoint_url("act_42/campaigns"),
            "https://graph.facebook.com/v23.0/act_42/campaigns"
        );
        assert_eq!(c.endpoint_url("/me"), "https://graph.facebook.com/v23.0/me");
    }

    #[test]
    fn test_builder_requires_auth_and_valid_config() {
        let err = ApiClient::builder().config(ClientConfig::for_account("42")).build().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("auth provider"));

        let err = ApiClient::builder()
            .auth(Arc::new(StaticTokenProvider::new("t")))
            .build()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("account_id"));
    }

    #[test]
    fn test_shared_gate_is_used() {
        let gate = Arc::new(RateGate::new());
        let c = ApiClient::builder()
            .config(ClientConfig::for_account("42"))
            .auth(Arc::new(StaticTokenProvider::new("t")))
            .rate_gate(Arc::clone(&gate))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(c.rate_gate(), &gate));
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let delivered = Delivered {
            response: HttpResponse {
                status: 204,
                body: String::new(),
            },
            attempts: 1,
            label: "POST act_42/ads".into(),
        };
        decode::<()>(&delivered).unwrap();

        let err = decode::<Vec<String>>(&delivered).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProtocolError);
        assert_eq!(err.http_status, Some(204));
        assert_eq!(err.context.as_deref(), Some("POST act_42/ads"));
    }
}
