//! Resilience patterns for calling a quota-limited remote API
//!
//! This module provides **generic, reusable** building blocks:
//! - **Retry**: sequential attempts where a caller-supplied policy decides,
//!   per failure, the retry budget and whether to wait a fixed hint or an
//!   exponential backoff with jitter
//! - **Rate Gate**: fixed-window call budgets per scope that fail fast
//!   instead of blocking, leaving the wait to the retry backoff
//! - **Clock**: time abstraction shared by both so window and delay
//!   behaviour can be tested without real waiting
//!
//! The ads-specific policy (which error kinds retry, how often) lives in
//! `adreach-infra`; these types stay generic over the error type.

pub mod clock;
pub mod rate_gate;
pub mod retry;

pub use clock::{Clock, MockClock, SystemClock};
pub use rate_gate::{CallScope, RateGate, RateGateError, Tier, WINDOW_DURATION};
pub use retry::{
    DelayStrategy, ExponentialBackoff, RetryDirective, RetryError, RetryEvent, RetryExecutor,
    RetryObserver, RetryOutcome, RetryPolicy, TracingRetryObserver,
};
