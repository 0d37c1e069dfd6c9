//! Access token supply
//!
//! The client never stores credentials itself; it asks an
//! [`AccessTokenProvider`] once per logical operation. Token values are
//! never logged.

use std::fmt;

use adreach_domain::ApiError;
use async_trait::async_trait;
use tracing::debug;

/// Environment variable read by [`EnvTokenProvider`]
pub const ACCESS_TOKEN_VAR: &str = "META_ACCESS_TOKEN";

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get the bearer token for the next call
    async fn access_token(&self) -> Result<String, ApiError>;

    /// Whether a usable token is available.
    ///
    /// Returning `false` fails the operation with an authentication error
    /// before any call is made.
    async fn is_valid(&self) -> bool;
}

/// Reads the token from an environment variable on every call, so a
/// rotated token is picked up without rebuilding the client.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    /// Provider reading `META_ACCESS_TOKEN`
    pub fn new() -> Self {
        Self::with_var(ACCESS_TOKEN_VAR)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    fn read(&self) -> Option<String> {
        std::env::var(&self.var).ok().map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessTokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        self.read().ok_or_else(|| {
            debug!(var = %self.var, "access token variable missing or empty");
            ApiError::authentication(format!("{} is not set", self.var))
        })
    }

    async fn is_valid(&self) -> bool {
        self.read().is_some()
    }
}

/// Fixed token, e.g. one handed over by a host process
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::authentication("access token is empty"));
        }
        Ok(self.token.clone())
    }

    async fn is_valid(&self) -> bool {
        !self.token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use adreach_domain::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("test-token");

        assert!(provider.is_valid().await);
        assert_eq!(provider.access_token().await.unwrap(), "test-token");
        assert!(!format!("{provider:?}").contains("test-token"));
    }

    #[tokio::test]
    async fn test_empty_static_token_is_invalid() {
        let provider = StaticTokenProvider::new("");

        assert!(!provider.is_valid().await);
        assert_eq!(provider.access_token().await.unwrap_err().kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_env_provider_reads_variable_each_time() {
        let var = "ADREACH_TEST_TOKEN_ROTATION";
        let provider = EnvTokenProvider::with_var(var);

        std::env::remove_var(var);
        assert!(!provider.is_valid().await);
        let err = provider.access_token().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert!(err.message.contains(var));

        std::env::set_var(var, "  first  ");
        assert_eq!(provider.access_token().await.unwrap(), "first");

        std::env::set_var(var, "second");
        assert_eq!(provider.access_token().await.unwrap(), "second");

        std::env::remove_var(var);
    }
}
