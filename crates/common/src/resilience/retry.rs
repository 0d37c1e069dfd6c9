//! Retry orchestration with per-failure backoff selection
//!
//! [`RetryExecutor`] runs an operation, and on each failure asks a
//! [`RetryPolicy`] for a [`RetryDirective`]: stop now, or retry up to
//! `max_retries` times waiting either a fixed hint or an exponential backoff
//! with additive jitter. Attempts are strictly sequential. Every scheduled
//! retry is reported to a [`RetryObserver`] before the delay starts.
//!
//! Terminal errors always carry the context label, the number of attempts
//! made and the last underlying error unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

/// Default first backoff step
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
/// Default ceiling for the exponential component
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(60_000);
/// Default upper bound (exclusive) for the additive jitter
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1_000);

/// Terminal outcome of a retried operation
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The policy refused to retry this failure
    #[error("{label}: {source}")]
    NonRetryable {
        /// Context label of the operation
        label: String,
        /// Invocations made, including the failing one
        attempts: u32,
        /// The failure the policy stopped on
        source: E,
    },

    /// The retry budget for the failure kind was used up
    #[error("{label} failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Context label of the operation
        label: String,
        /// Invocations made, initial attempt included
        attempts: u32,
        /// Failure of the final attempt
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Number of times the operation was invoked
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NonRetryable { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Context label the operation ran under
    pub fn label(&self) -> &str {
        match self {
            Self::NonRetryable { label, .. } | Self::Exhausted { label, .. } => label,
        }
    }

    /// Borrow the last underlying error
    pub fn last_error(&self) -> &E {
        match self {
            Self::NonRetryable { source, .. } | Self::Exhausted { source, .. } => source,
        }
    }

    /// Consume and return the last underlying error
    pub fn into_last_error(self) -> E {
        match self {
            Self::NonRetryable { source, .. } | Self::Exhausted { source, .. } => source,
        }
    }

    /// Whether the retry budget ran out (as opposed to an immediate stop)
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// How long to wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    /// Wait exactly this long (e.g. a server-provided retry hint)
    Fixed(Duration),
    /// Use the executor's [`ExponentialBackoff`]
    Exponential,
}

/// Decision returned by a [`RetryPolicy`] for one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDirective {
    /// Propagate the failure immediately
    Stop,
    /// Retry while fewer than `max_retries` retries have been made
    Retry { max_retries: u32, delay: DelayStrategy },
}

/// Trait for deciding how a failure should be retried
pub trait RetryPolicy<E> {
    /// Inspect the failure and choose a directive
    fn directive(&self, error: &E) -> RetryDirective;
}

impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E) -> RetryDirective,
{
    fn directive(&self, error: &E) -> RetryDirective {
        self(error)
    }
}

/// Exponential backoff with additive uniform jitter
///
/// The delay after the `k`-th failed attempt (0-based) is
/// `min(base_delay * 2^k, max_delay) + uniform[0, max_jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl ExponentialBackoff {
    /// Create a backoff with explicit parameters
    pub fn new(base_delay: Duration, max_delay: Duration, max_jitter: Duration) -> Self {
        Self { base_delay, max_delay, max_jitter }
    }

    /// Deterministic component for retry index `k`
    pub fn base_for(&self, k: u32) -> Duration {
        let factor = 1u32.checked_shl(k).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Full delay for retry index `k`, including jitter
    pub fn delay_for(&self, k: u32) -> Duration {
        self.base_for(k) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

/// Diagnostic event emitted before every retry delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryEvent {
    /// Context label of the logical operation
    pub label: String,
    /// 1-based number of the attempt that just failed
    pub attempt: u32,
    /// Delay scheduled before the next attempt
    pub delay: Duration,
    /// Display form of the failure
    pub message: String,
}

/// Sink for retry diagnostics
///
/// Observers are fire-and-forget: they cannot influence the retry loop.
pub trait RetryObserver: Send + Sync {
    /// Called once per scheduled retry
    fn on_retry(&self, event: &RetryEvent);
}

/// Default observer that writes retry events as structured tracing records
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRetryObserver;

impl RetryObserver for TracingRetryObserver {
    fn on_retry(&self, event: &RetryEvent) {
        warn!(
            label = %event.label,
            attempt = event.attempt,
            delay_ms = event.delay.as_millis() as u64,
            message = %event.message,
            "retrying operation"
        );
    }
}

/// Result of an execution plus summary statistics
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, RetryError<E>>,
    pub attempts: u32,
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, RetryError<E>> {
        self.result
    }
}

/// The main retry executor
pub struct RetryExecutor<P> {
    policy: P,
    backoff: ExponentialBackoff,
    observer: Arc<dyn RetryObserver>,
}

impl<P: fmt::Debug> fmt::Debug for RetryExecutor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl<P> RetryExecutor<P> {
    /// Create an executor with default backoff and tracing diagnostics
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            backoff: ExponentialBackoff::default(),
            observer: Arc::new(TracingRetryObserver),
        }
    }

    /// Replace the exponential backoff parameters
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the diagnostic sink
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Backoff in use
    pub fn backoff(&self) -> &ExponentialBackoff {
        &self.backoff
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, label: &str, operation: F) -> Result<T, RetryError<E>>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(label, operation).await.into_result()
    }

    /// Execute an operation with retry logic and return outcome statistics.
    pub async fn execute_with_outcome<F, Fut, T, E>(
        &self,
        label: &str,
        mut operation: F,
    ) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries: u32 = 0;
        let mut total_delay = Duration::ZERO;

        loop {
            let attempt = retries + 1;
            debug!(label, attempt, "executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!(label, retries, "operation succeeded after retries");
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt, total_delay };
                }
                Err(error) => error,
            };

            let (max_retries, strategy) = match self.policy.directive(&error) {
                RetryDirective::Stop => {
                    debug!(label, attempt, error = %error, "failure is not retryable");
                    return RetryOutcome {
                        result: Err(RetryError::NonRetryable {
                            label: label.to_string(),
                            attempts: attempt,
                            source: error,
                        }),
                        attempts: attempt,
                        total_delay,
                    };
                }
                RetryDirective::Retry { max_retries, delay } => (max_retries, delay),
            };

            if retries >= max_retries {
                warn!(label, attempts = attempt, error = %error, "retry attempts exhausted");
                return RetryOutcome {
                    result: Err(RetryError::Exhausted {
                        label: label.to_string(),
                        attempts: attempt,
                        source: error,
                    }),
                    attempts: attempt,
                    total_delay,
                };
            }

            let delay = match strategy {
                DelayStrategy::Fixed(delay) => delay,
                DelayStrategy::Exponential => self.backoff.delay_for(retries),
            };

            self.observer.on_retry(&RetryEvent {
                label: label.to_string(),
                attempt,
                delay,
                message: error.to_string(),
            });

            tokio::time::sleep(delay).await;
            total_delay += delay;
            retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestError(&'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<RetryEvent>>,
    }

    impl RetryObserver for RecordingObserver {
        fn on_retry(&self, event: &RetryEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn retry_twice(_: &TestError) -> RetryDirective {
        RetryDirective::Retry { max_retries: 2, delay: DelayStrategy::Exponential }
    }

    fn never(_: &TestError) -> RetryDirective {
        RetryDirective::Stop
    }

    #[test]
    fn test_exponential_base_doubles_and_caps() {
        let backoff = ExponentialBackoff::default();

        assert_eq!(backoff.base_for(0), Duration::from_millis(1_000));
        assert_eq!(backoff.base_for(1), Duration::from_millis(2_000));
        assert_eq!(backoff.base_for(5), Duration::from_millis(32_000));
        assert_eq!(backoff.base_for(6), Duration::from_millis(60_000));
        assert_eq!(backoff.base_for(40), Duration::from_millis(60_000));
    }

    #[test]
    fn test_delay_for_stays_within_jitter_band() {
        let backoff = ExponentialBackoff::default();

        for k in 0..8 {
            let base = backoff.base_for(k);
            for _ in 0..50 {
                let delay = backoff.delay_for(k);
                assert!(delay >= base, "delay {delay:?} below base {base:?}");
                assert!(delay < base + Duration::from_millis(1_000));
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let backoff = ExponentialBackoff::new(
            Duration::from_millis(10),
            Duration::from_millis(100),
            Duration::ZERO,
        );
        assert_eq!(backoff.delay_for(2), Duration::from_millis(40));
        assert_eq!(backoff.delay_for(9), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let executor = RetryExecutor::new(retry_twice);

        let outcome =
            executor.execute_with_outcome("ok", || async { Ok::<_, TestError>(7) }).await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.total_delay, Duration::ZERO);
        assert_eq!(outcome.into_result().unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_directive_invokes_once() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(never);

        let result: Result<(), _> = executor
            .execute("stop", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError("bad input")) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!err.is_exhausted());
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.to_string(), "stop: bad input");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_keeps_label_attempts_and_last_error() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(retry_twice);

        let result: Result<(), _> = executor
            .execute("list campaigns", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(if n < 2 { TestError("first") } else { TestError("last") }) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.is_exhausted());
        assert_eq!(err.label(), "list campaigns");
        assert_eq!(err.last_error(), &TestError("last"));
        assert_eq!(err.to_string(), "list campaigns failed after 3 attempts: last");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_is_used_verbatim() {
        let observer = Arc::new(RecordingObserver::default());
        let executor = RetryExecutor::new(|_: &TestError| RetryDirective::Retry {
            max_retries: 1,
            delay: DelayStrategy::Fixed(Duration::from_secs(300)),
        })
        .with_observer(observer.clone());

        let outcome = executor
            .execute_with_outcome("hinted", || async { Err::<(), _>(TestError("throttled")) })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.total_delay, Duration::from_secs(300));
        let events = observer.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            RetryEvent {
                label: "hinted".to_string(),
                attempt: 1,
                delay: Duration::from_secs(300),
                message: "throttled".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let observer = Arc::new(RecordingObserver::default());
        let executor = RetryExecutor::new(retry_twice).with_observer(observer.clone());

        let result = executor
            .execute("flaky", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(TestError("blip"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(observer.events.lock().unwrap().len(), 1);
    }
}
