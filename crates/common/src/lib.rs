//! Shared resilience primitives for the AdReach crates.
//!
//! Nothing in this crate knows about the ads platform. It provides:
//! - a `Clock` abstraction so time-windowed state can be tested
//!   deterministically
//! - a retry executor that asks a policy, per failure, whether and how long
//!   to back off
//! - a fixed-window rate gate that admits or refuses calls per scope

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;

// Re-export commonly used types and traits for convenience
pub use resilience::{
    CallScope, Clock, DelayStrategy, ExponentialBackoff, MockClock, RateGate, RateGateError,
    RetryDirective, RetryError, RetryEvent, RetryExecutor, RetryObserver, RetryOutcome,
    RetryPolicy, SystemClock, Tier, TracingRetryObserver,
};
