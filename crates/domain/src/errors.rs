//! Error types used throughout the client
//!
//! Every failure the client surfaces is one [`ApiError`]: a single tagged
//! value whose [`ErrorKind`] callers match on. All classification branches
//! populate the same field set; fields the platform did not supply stay
//! `None`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::impl_name_conversions;

/// Semantic class of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Throttled, usually with a known cool-down
    RateLimited,
    /// Access token missing, expired or revoked
    Authentication,
    /// Token lacks the permission, or the operation is disabled locally
    Permission,
    /// Invalid parameter
    Validation,
    /// App-level call limit (code 4)
    ApplicationCallLimit,
    /// User-level call limit (code 17)
    UserCallLimit,
    /// 5xx response or transport failure
    ServerError,
    /// Response body was not the expected JSON
    ProtocolError,
    Unknown,
}

impl_name_conversions!(ErrorKind {
    RateLimited => "rate_limited",
    Authentication => "authentication",
    Permission => "permission",
    Validation => "validation",
    ApplicationCallLimit => "application_call_limit",
    UserCallLimit => "user_call_limit",
    ServerError => "server_error",
    ProtocolError => "protocol_error",
    Unknown => "unknown",
});

impl ErrorKind {
    /// Kinds that a later attempt can succeed on
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ApplicationCallLimit | Self::UserCallLimit | Self::ServerError
        )
    }
}

/// Canonical failure value returned by every client operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub http_status: Option<u16>,
    pub code: Option<i64>,
    pub subcode: Option<i64>,
    /// Platform exception type, e.g. `OAuthException`
    pub error_type: Option<String>,
    pub retry_after: Option<Duration>,
    pub fbtrace_id: Option<String>,
    /// Invocations made for the logical operation; 0 until it has run
    pub attempts: u32,
    /// Label of the logical operation
    pub context: Option<String>,
}

impl ApiError {
    /// Create an error with only kind and message set
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            code: None,
            subcode: None,
            error_type: None,
            retry_after: None,
            fbtrace_id: None,
            attempts: 0,
            context: None,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self { retry_after, ..Self::new(ErrorKind::RateLimited, message) }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Unparseable body; `raw` is kept verbatim
    pub fn protocol(raw: impl Into<String>, http_status: Option<u16>) -> Self {
        Self { http_status, ..Self::new(ErrorKind::ProtocolError, raw) }
    }

    pub fn with_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }

    pub fn with_codes(mut self, code: Option<i64>, subcode: Option<i64>) -> Self {
        self.code = code;
        self.subcode = subcode;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn with_trace_id(mut self, fbtrace_id: impl Into<String>) -> Self {
        self.fbtrace_id = Some(fbtrace_id.into());
        self
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Record the operation label and how many attempts it took
    pub fn with_context(mut self, label: impl Into<String>, attempts: u32) -> Self {
        self.context = Some(label.into());
        self.attempts = attempts;
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Cool-down in whole milliseconds, if known
    pub fn retry_after_ms(&self) -> Option<u64> {
        self.retry_after.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.context, self.attempts) {
            (Some(ctx), n) if n > 1 => write!(f, "{ctx} failed after {n} attempts: ")?,
            (Some(ctx), _) => write!(f, "{ctx}: ")?,
            (None, _) => {}
        }

        write!(f, "[{}] {}", self.kind, self.message)?;

        if let Some(status) = self.http_status {
            write!(f, " (HTTP {status})")?;
        }
        match (self.code, self.subcode) {
            (Some(code), Some(sub)) => write!(f, " [code {code}, subcode {sub}]")?,
            (Some(code), None) => write!(f, " [code {code}]")?,
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
