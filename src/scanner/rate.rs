// src/scanner/rate.rs
// =============================================================================
// This module owns the scan-wide rate limiting state and the retry/backoff
// policy.
//
// How the adaptive part works:
// - Every worker reads the shared delay before each request and sleeps
//   for it (plus jitter), which throttles the whole pool without any
//   central scheduler
// - When a worker sees HTTP 429, it records a throttling event; after
//   THROTTLE_THRESHOLD consecutive events the shared delay is raised by
//   one step, clamped to a ceiling
// - Every successful response decrements the event counter (floored at
//   zero), letting the scan speed back up once conditions improve
//
// The "decrement on every success" rule mirrors the original tool. It can
// undercount pressure when 429s and successes interleave quickly - treat
// the threshold/step/ceiling as tunables, not gospel.
//
// Rust concepts:
// - Mutex around a small struct: one lock, one invariant
// - Duration arithmetic with saturating/clamping semantics
// =============================================================================

use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;

/// Consecutive 429s before the shared delay is raised.
const THROTTLE_THRESHOLD: u32 = 3;

/// How much the shared delay grows per escalation.
const DELAY_STEP: Duration = Duration::from_secs(1);

/// Hard ceiling for the shared delay.
const DELAY_CEILING: Duration = Duration::from_secs(5);

// The scan-wide rate state: a consecutive-throttling counter and the
// current inter-request delay, both behind one lock so the pair always
// changes together.
struct RateState {
    throttle_events: u32,
    delay: Duration,
}

// Shared handle that workers use to cooperate on slowing down.
//
// Cheap to share via Arc; every method takes &self.
pub struct RateLimiter {
    state: Mutex<RateState>,
}

impl RateLimiter {
    /// Creates a limiter starting at the user's base delay (-d flag).
    pub fn new(base_delay: Duration) -> Self {
        RateLimiter {
            state: Mutex::new(RateState {
                throttle_events: 0,
                delay: base_delay,
            }),
        }
    }

    /// The delay every worker should sleep before its next request.
    pub fn current_delay(&self) -> Duration {
        self.state.lock().unwrap().delay
    }

    /// Records one throttled (HTTP 429) response.
    ///
    /// Once the consecutive count crosses the threshold, the shared delay
    /// grows by one step. Invariant: the delay never exceeds the ceiling,
    /// no matter how many further 429s arrive.
    pub fn record_throttled(&self) {
        let mut state = self.state.lock().unwrap();
        state.throttle_events += 1;
        if state.throttle_events >= THROTTLE_THRESHOLD {
            state.delay = (state.delay + DELAY_STEP).min(DELAY_CEILING);
        }
    }

    /// Records one successful (non-throttled) response.
    ///
    /// Decrements the event counter, floored at zero - it never goes
    /// negative. This is what lets the pool self-heal after a 429 burst.
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.throttle_events = state.throttle_events.saturating_sub(1);
    }

    #[cfg(test)]
    fn throttle_events(&self) -> u32 {
        self.state.lock().unwrap().throttle_events
    }
}

// The per-call retry policy: how many attempts a single verification gets
// and how long to back off between them.
//
// backoff() is a pure function of the attempt number so it can be tested
// without a clock or a network.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts per URL (first try included).
    pub max_attempts: u32,
    /// Backoff for the first retry.
    pub base: Duration,
    /// Backoff never grows beyond this.
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given attempt number (1-based):
    /// base * 2^(attempt-1), clamped to the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = 1u32 << exponent;
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// A small random delay, uniform in [0, 1) seconds.
///
/// Added to every computed wait so that workers which got throttled at the
/// same moment don't all retry at the same moment too.
pub fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..1000))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one Mutex around a two-field struct?
//    - The counter and the delay must change together (crossing the
//      threshold raises the delay); two separate locks could tear
//    - One lock around the pair makes the invariant easy to see
//
// 2. What is saturating_sub?
//    - Subtraction that stops at zero instead of wrapping around
//    - Exactly the "floored at zero" rule the counter needs
//
// 3. Why cap the exponent at 16?
//    - 1u32 << attempt overflows for large attempt numbers
//    - The cap clamps the result anyway, so past 2^16 the extra bits
//      only risk overflow without changing the answer
// -----------------------------------------------------------------------------
