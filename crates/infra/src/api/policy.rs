//! Retry budgets per error kind

use adreach_common::resilience::{DelayStrategy, RetryDirective, RetryPolicy};
use adreach_domain::{ApiError, ErrorKind};

pub const RATE_LIMITED_RETRIES: u32 = 3;
pub const CALL_LIMIT_RETRIES: u32 = 2;
pub const SERVER_ERROR_RETRIES: u32 = 3;

/// Maps a classified [`ApiError`] to a retry directive.
///
/// Reads use [`ApiRetryPolicy::reads`]. Writes use
/// [`ApiRetryPolicy::mutations`], which only retries throttles: a server
/// error on a write may have been applied, so it is not repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiRetryPolicy {
    idempotent: bool,
}

impl ApiRetryPolicy {
    pub const fn reads() -> Self {
        Self { idempotent: true }
    }

    pub const fn mutations() -> Self {
        Self { idempotent: false }
    }

    pub const fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// Directive for one classified failure
    pub fn directive_for(&self, error: &ApiError) -> RetryDirective {
        match error.kind {
            ErrorKind::RateLimited => RetryDirective::Retry {
                max_retries: RATE_LIMITED_RETRIES,
                delay: error.retry_after.map_or(DelayStrategy::Exponential, DelayStrategy::Fixed),
            },
            ErrorKind::ApplicationCallLimit | ErrorKind::UserCallLimit => RetryDirective::Retry {
                max_retries: CALL_LIMIT_RETRIES,
                delay: DelayStrategy::Exponential,
            },
            ErrorKind::ServerError if self.idempotent => RetryDirective::Retry {
                max_retries: SERVER_ERROR_RETRIES,
                delay: DelayStrategy::Exponential,
            },
            _ => RetryDirective::Stop,
        }
    }
}

impl Default for ApiRetryPolicy {
    fn default() -> Self {
        Self::reads()
    }
}

impl RetryPolicy<ApiError> for ApiRetryPolicy {
    fn directive(&self, error: &ApiError) -> RetryDirective {
        self.directive_for(error)
    }
}
