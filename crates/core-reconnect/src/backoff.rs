//! Reconnect scheduling
//!
//! Two regimes, picked by whether the last resolution still has candidates:
//!
//! - **Fallback**: candidates remain, so retry after a short fixed pause. An
//!   immediate retry would let pending events for the socket that just closed
//!   land on the new one; the pause gives the event loop time to drain them.
//! - **Exhausted**: every candidate failed. Wait until `reconnect_interval`
//!   after the previous attempt plus uniform jitter. When that lands too close
//!   (below `2 * min_reconnect_delay`) a fresh draw from
//!   `[min_reconnect_delay, 2 * min_reconnect_delay)` replaces it, so full
//!   cycles are never closer than the floor and independent clients spread out.
//!
//! # Example
//!
//! ```
//! use tether_core_reconnect::{BackoffScheduler, ReconnectConfig, ScriptedJitter};
//! use std::time::Duration;
//!
//! let mut scheduler = BackoffScheduler::new(&ReconnectConfig::default());
//! let mut jitter = ScriptedJitter::zero();
//!
//! // One candidate left: fixed half-second pause
//! let now = Duration::from_secs(100);
//! let delay = scheduler.schedule(now, now, true, &mut jitter).unwrap();
//! assert_eq!(delay, Duration::from_millis(500));
//!
//! // Already pending: nothing changes
//! assert!(scheduler.schedule(now, now, false, &mut jitter).is_none());
//! ```

use crate::config::ReconnectConfig;
use crate::jitter::JitterSource;
use std::time::Duration;

/// Computes and holds the next reconnect time
#[derive(Debug, Clone)]
pub struct BackoffScheduler {
    reconnect_interval: f64,
    reconnect_jitter: f64,
    min_delay: f64,
    fallback_delay: Duration,
    reconnect_at: Option<Duration>,
}

impl BackoffScheduler {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            reconnect_interval: config.reconnect_interval,
            reconnect_jitter: config.reconnect_jitter,
            min_delay: config.min_reconnect_delay,
            fallback_delay: config.address_fallback_duration(),
            reconnect_at: None,
        }
    }

    /// When the next attempt is due, if one is scheduled
    pub fn reconnect_at(&self) -> Option<Duration> {
        self.reconnect_at
    }

    /// Schedule the next attempt unless one is already pending.
    ///
    /// Returns the chosen delay when a new schedule was set, `None` when an
    /// existing schedule was left untouched.
    pub fn schedule<J: JitterSource + ?Sized>(
        &mut self,
        now: Duration,
        last_try: Duration,
        candidates_remaining: bool,
        jitter: &mut J,
    ) -> Option<Duration> {
        if self.reconnect_at.is_some() {
            return None;
        }

        let delay = self.next_delay(now, last_try, candidates_remaining, jitter);
        self.reconnect_at = Some(now.saturating_add(delay));
        Some(delay)
    }

    /// Delay until the next attempt, without touching the schedule
    pub fn next_delay<J: JitterSource + ?Sized>(
        &self,
        now: Duration,
        last_try: Duration,
        candidates_remaining: bool,
        jitter: &mut J,
    ) -> Duration {
        if candidates_remaining {
            return self.fallback_delay;
        }

        let raw = last_try.as_secs_f64() + self.reconnect_interval - now.as_secs_f64()
            + jitter.uniform(0.0, self.reconnect_jitter);

        let floor = 2.0 * self.min_delay;
        let delay = if raw < floor {
            jitter.uniform(self.min_delay, floor)
        } else {
            raw
        };

        Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX)
    }

    /// Clear the schedule if it is due at `now`.
    ///
    /// Returns `true` when the caller should start a reconnect.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.reconnect_at {
            Some(at) if at <= now => {
                self.reconnect_at = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending schedule, when an attempt starts outside `take_due`
    pub fn cancel(&mut self) {
        self.reconnect_at = None;
    }
}
