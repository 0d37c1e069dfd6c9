//! Fixed-window call budgets per scope
//!
//! A [`RateGate`] owns one [`CallScope`] per scope id, created lazily on the
//! first admission request. Each scope counts calls in a fixed window of
//! [`WINDOW_DURATION`]; once the window has elapsed the counter resets in one
//! step on the next admission. When a scope's tier budget is used up,
//! [`RateGate::admit`] fails immediately with [`RateGateError`] instead of
//! waiting, so that the caller's retry backoff is the only place time is
//! spent.
//!
//! Every read-modify-write of a scope happens while holding that scope's map
//! entry, so concurrent admissions for the same scope are serialized and can
//! neither overshoot nor lose counts. Different scopes do not contend beyond
//! map sharding.
//!
//! State is process-local. Separate processes sharing one platform account
//! each keep their own counters.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Clock, SystemClock};

/// Length of one budget window
pub const WINDOW_DURATION: Duration = Duration::from_secs(5 * 60);

/// Platform quota class of an app/account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    /// Development access: 60 calls per window
    #[default]
    Development,
    /// Standard access: 9000 calls per window
    Standard,
}

impl Tier {
    /// Calls admitted per window
    pub const fn budget(self) -> u32 {
        match self {
            Self::Development => 60,
            Self::Standard => 9_000,
        }
    }

    /// Stable lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "standard" => Ok(Self::Standard),
            other => Err(format!("unknown tier '{other}' (expected development or standard)")),
        }
    }
}

/// Call counter for one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallScope {
    pub scope_id: String,
    pub tier: Tier,
    pub window_start: Instant,
    pub calls_in_window: u32,
    pub window_duration: Duration,
}

impl CallScope {
    fn new(scope_id: &str, tier: Tier, now: Instant, window_duration: Duration) -> Self {
        Self {
            scope_id: scope_id.to_string(),
            tier,
            window_start: now,
            calls_in_window: 0,
            window_duration,
        }
    }

    /// Instant at which the current window ends
    pub fn window_end(&self) -> Instant {
        self.window_start + self.window_duration
    }

    /// Calls still available in the current window
    pub fn remaining(&self) -> u32 {
        self.tier.budget().saturating_sub(self.calls_in_window)
    }

    fn roll_window(&mut self, now: Instant) {
        if now >= self.window_end() {
            debug!(
                scope_id = %self.scope_id,
                calls = self.calls_in_window,
                "call window elapsed, resetting counter"
            );
            self.window_start = now;
            self.calls_in_window = 0;
        }
    }
}

/// Admission refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateGateError {
    /// The scope used its whole budget in the current window
    #[error(
        "call budget exhausted for scope {scope_id} ({budget} calls per window on {tier} tier), \
         window resets in {retry_after:?}"
    )]
    BudgetExhausted {
        /// Scope that was refused
        scope_id: String,
        /// Tier the call was admitted under
        tier: Tier,
        /// Calls allowed per window for that tier
        budget: u32,
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateGateError {
    /// Time until the refusing scope's window resets
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::BudgetExhausted { retry_after, .. } => *retry_after,
        }
    }
}

/// Per-scope fixed-window admission control
pub struct RateGate<C: Clock = SystemClock> {
    scopes: DashMap<String, CallScope>,
    clock: C,
    window_duration: Duration,
}

impl<C: Clock> fmt::Debug for RateGate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateGate")
            .field("scopes", &self.scopes.len())
            .field("window_duration", &self.window_duration)
            .finish()
    }
}

impl RateGate<SystemClock> {
    /// Create a gate using the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RateGate<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateGate<C> {
    /// Create a gate with a custom clock
    pub fn with_clock(clock: C) -> Self {
        Self { scopes: DashMap::new(), clock, window_duration: WINDOW_DURATION }
    }

    /// Admit one call for `scope_id` under `tier`'s budget
    ///
    /// # Errors
    ///
    /// Returns [`RateGateError::BudgetExhausted`] without waiting when the
    /// scope has used its whole budget in the current window.
    pub fn admit(&self, scope_id: &str, tier: Tier) -> Result<(), RateGateError> {
        let now = self.clock.now();

        // The entry guard is the scope's critical section.
        let mut scope = self
            .scopes
            .entry(scope_id.to_string())
            .or_insert_with(|| CallScope::new(scope_id, tier, now, self.window_duration));

        scope.roll_window(now);
        if scope.tier != tier {
            debug!(scope_id, from = %scope.tier, to = %tier, "scope tier changed");
            scope.tier = tier;
        }

        let budget = tier.budget();
        if scope.calls_in_window >= budget {
            let retry_after = scope.window_end().saturating_duration_since(now);
            warn!(
                scope_id,
                tier = %tier,
                budget,
                retry_after_ms = retry_after.as_millis() as u64,
                "call budget exhausted"
            );
            return Err(RateGateError::BudgetExhausted {
                scope_id: scope_id.to_string(),
                tier,
                budget,
                retry_after,
            });
        }

        scope.calls_in_window += 1;
        Ok(())
    }

    /// Copy of a scope's current state, if it has been seen
    pub fn snapshot(&self, scope_id: &str) -> Option<CallScope> {
        self.scopes.get(scope_id).map(|scope| scope.clone())
    }

    /// Calls left for `scope_id` in its current window
    pub fn remaining(&self, scope_id: &str, tier: Tier) -> u32 {
        let now = self.clock.now();
        match self.scopes.get(scope_id) {
            Some(scope) if now < scope.window_end() => {
                tier.budget().saturating_sub(scope.calls_in_window)
            }
            _ => tier.budget(),
        }
    }

    /// Number of scopes tracked
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}
