//! Integration tests for the resilience module
//!
//! Exercises the rate gate under real thread contention and the retry
//! executor with the delay strategies used for throttled calls.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adreach_common::resilience::{
    DelayStrategy, ExponentialBackoff, RateGate, RetryDirective, RetryEvent, RetryExecutor,
    RetryObserver, Tier,
};

#[derive(Debug, Clone, PartialEq)]
enum TestError {
    Throttled { hint: Option<Duration> },
    Overloaded,
    Invalid,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Throttled { .. } => f.write_str("throttled"),
            Self::Overloaded => f.write_str("overloaded"),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

fn policy(error: &TestError) -> RetryDirective {
    match error {
        TestError::Throttled { hint } => RetryDirective::Retry {
            max_retries: 3,
            delay: hint.map_or(DelayStrategy::Exponential, DelayStrategy::Fixed),
        },
        TestError::Overloaded => {
            RetryDirective::Retry { max_retries: 2, delay: DelayStrategy::Exponential }
        }
        TestError::Invalid => RetryDirective::Stop,
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<RetryEvent>>,
}

impl RetryObserver for Recorder {
    fn on_retry(&self, event: &RetryEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Validates that a shared gate never overshoots its budget under contention.
///
/// 61 tasks race for a development-tier scope on a multi-threaded runtime;
/// exactly 60 must be admitted and one refused.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_admissions_respect_budget() {
    let gate = Arc::new(RateGate::new());
    let mut handles = Vec::new();

    for _ in 0..61 {
        let gate = Arc::clone(&gate);
        handles.push(tokio::spawn(async move { gate.admit("act_42", Tier::Development) }));
    }

    let mut admitted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => admitted += 1,
            Err(err) => {
                assert!(err.retry_after() <= Duration::from_secs(300));
                refused += 1;
            }
        }
    }

    assert_eq!(admitted, 60);
    assert_eq!(refused, 1);
    assert_eq!(gate.snapshot("act_42").unwrap().calls_in_window, 60);
}

/// Validates that contention on one scope does not consume another's budget.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scopes_are_isolated() {
    let gate = Arc::new(RateGate::new());
    let mut handles = Vec::new();

    for i in 0..120 {
        let gate = Arc::clone(&gate);
        let scope = if i % 2 == 0 { "act_a" } else { "act_b" };
        handles.push(tokio::spawn(async move { gate.admit(scope, Tier::Development) }));
    }

    let admitted = futures::future::join_all(handles)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(()))))
        .count();

    assert_eq!(admitted, 120);
    assert_eq!(gate.remaining("act_a", Tier::Development), 0);
    assert_eq!(gate.remaining("act_b", Tier::Development), 0);
}

/// Validates that a throttled call is invoked at most 1 + 3 times.
#[tokio::test(start_paused = true)]
async fn test_throttled_call_gives_up_after_three_retries() {
    let calls = Arc::new(AtomicU32::new(0));
    let recorder = Arc::new(Recorder::default());
    let executor = RetryExecutor::new(policy).with_observer(recorder.clone());

    let counter = Arc::clone(&calls);
    let result: Result<(), _> = executor
        .execute("insights", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Throttled { hint: Some(Duration::from_secs(300)) }) }
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(err.attempts(), 4);
    assert!(err.is_exhausted());

    let events = recorder.events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.delay == Duration::from_secs(300)));
    assert_eq!(events.iter().map(|e| e.attempt).collect::<Vec<_>>(), vec![1, 2, 3]);
}

/// Validates exponential delays land inside `[base * 2^k, base * 2^k + jitter)`.
#[tokio::test(start_paused = true)]
async fn test_exponential_delays_fall_in_bands() {
    let recorder = Arc::new(Recorder::default());
    let executor = RetryExecutor::new(policy).with_observer(recorder.clone());

    let outcome = executor
        .execute_with_outcome("campaigns", || async {
            Err::<(), _>(TestError::Throttled { hint: None })
        })
        .await;
    assert_eq!(outcome.attempts, 4);

    let events = recorder.events.lock().unwrap();
    let bands = [(1_000, 2_000), (2_000, 3_000), (4_000, 5_000)];
    for (event, (low, high)) in events.iter().zip(bands) {
        let ms = event.delay.as_millis();
        assert!(ms >= low && ms < high, "delay {ms}ms outside [{low}, {high})");
    }
    let total: Duration = events.iter().map(|e| e.delay).sum();
    assert_eq!(outcome.total_delay, total);
}

/// Validates that the error kind of each failure drives the decision.
#[tokio::test(start_paused = true)]
async fn test_policy_is_consulted_per_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let executor = RetryExecutor::new(policy).with_backoff(ExponentialBackoff::new(
        Duration::from_millis(10),
        Duration::from_millis(100),
        Duration::ZERO,
    ));

    let counter = Arc::clone(&calls);
    let result: Result<(), _> = executor
        .execute("mixed", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(TestError::Overloaded)
                } else {
                    Err(TestError::Invalid)
                }
            }
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!err.is_exhausted());
    assert_eq!(err.last_error(), &TestError::Invalid);
}
