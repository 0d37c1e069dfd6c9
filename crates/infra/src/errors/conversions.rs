//! Conversions from infrastructure failures into [`ApiError`].
//!
//! Both sides of most of these conversions live in other crates, so they
//! go through [`IntoApiError`] rather than `From`.

use adreach_common::resilience::{RateGateError, RetryError};
use adreach_domain::{ApiError, ErrorKind};

use crate::config::ConfigError;
use crate::http::TransportError;

/// Fold an infrastructure error into the client's single error value
pub trait IntoApiError {
    fn into_api_error(self) -> ApiError;
}

/* -------------------------------------------------------------------------- */
/* TransportError → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for TransportError {
    fn into_api_error(self) -> ApiError {
        if self.is_connection_level() {
            // No status: the request may never have reached the platform.
            ApiError::server(self.to_string())
        } else {
            ApiError::validation(self.to_string())
        }
    }
}

/* -------------------------------------------------------------------------- */
/* RateGateError → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for RateGateError {
    fn into_api_error(self) -> ApiError {
        let retry_after = self.retry_after();
        ApiError::rate_limited(self.to_string(), Some(retry_after))
    }
}

/* -------------------------------------------------------------------------- */
/* RetryError<ApiError> → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for RetryError<ApiError> {
    fn into_api_error(self) -> ApiError {
        let attempts = self.attempts();
        let label = self.label().to_string();
        self.into_last_error().with_context(label, attempts)
    }
}

/* -------------------------------------------------------------------------- */
/* ConfigError → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for ConfigError {
    fn into_api_error(self) -> ApiError {
        ApiError::new(ErrorKind::Validation, self.to_string())
    }
}
