//! Session-wide request spacing
//!
//! All workers of a session share one [`RateLimiter`]. Each call to
//! [`RateLimiter::acquire`] reserves the next free slot under a lock and then
//! sleeps until that slot, so the aggregate request rate never exceeds one
//! request per interval no matter how many workers are waiting.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Longest spacing a limiter will enforce
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct LimiterState {
    /// Minimum spacing between two requests
    interval: Duration,

    /// Earliest instant the next request may start
    next_slot: Option<Instant>,
}

/// Minimum-spacing rate limiter shared by all fetch workers
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Creates a limiter allowing one request per `interval`
    ///
    /// Intervals above [`MAX_INTERVAL`] are clamped to it.
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                interval: interval.min(MAX_INTERVAL),
                next_slot: None,
            }),
        }
    }

    /// Creates a limiter from a requests-per-second ceiling
    pub fn per_second(requests_per_second: f64) -> Self {
        Self::new(interval_for_rate(requests_per_second))
    }

    /// Waits until the caller may issue a request
    pub async fn acquire(&self) {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Reserves the next slot and returns how long to wait for it
    fn reserve(&self, now: Instant) -> Duration {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = match state.next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        state.next_slot = Some(slot + state.interval);
        slot - now
    }

    /// Raises the interval to `interval` if that is slower than the current one
    ///
    /// Returns true if the interval changed.
    pub fn tighten(&self, interval: Duration) -> bool {
        let interval = interval.min(MAX_INTERVAL);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if interval > state.interval {
            state.interval = interval;
            true
        } else {
            false
        }
    }

    /// The current spacing between requests
    pub fn interval(&self) -> Duration {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .interval
    }
}

/// Spacing for a requests-per-second ceiling, saturating at [`MAX_INTERVAL`]
///
/// Rates that are zero, negative, NaN or too small to represent all map to
/// the longest interval instead of panicking in the `Duration` conversion.
pub fn interval_for_rate(requests_per_second: f64) -> Duration {
    let secs = (1.0 / requests_per_second).min(MAX_INTERVAL.as_secs_f64());
    Duration::try_from_secs_f64(secs).unwrap_or(MAX_INTERVAL)
}
