//! Failure-count-driven log suppression
//!
//! Every session shorter than `short_session` counts as a failure. When the
//! count climbs to `suppression_threshold` the suppressor switches on for
//! `suppression_window`; while on, failure, loss and disconnect messages are
//! withheld. Retries and state transitions are never affected.
//!
//! Expiry is lazy: the connection checks it at the start of each reconnect.
//! Clearing restores the count to `suppression_reset_failures` (2 by default)
//! rather than zero, so a single further short session re-arms suppression.
//!
//! ```
//! use tether_core_reconnect::{ErrorSuppressor, ReconnectConfig};
//! use std::time::Duration;
//!
//! let mut suppressor = ErrorSuppressor::new(&ReconnectConfig::default());
//! let short = Duration::from_secs(60);
//!
//! assert!(!suppressor.record_session(short));
//! assert!(!suppressor.record_session(short));
//! assert!(suppressor.record_session(short)); // third failure arms it
//!
//! suppressor.activate(Duration::from_secs(1000));
//! assert!(suppressor.is_active());
//! assert_eq!(suppressor.suppress_until(), Duration::from_secs(1900));
//! ```

use crate::config::ReconnectConfig;
use std::time::Duration;

/// Tracks short-lived sessions and the suppression window
#[derive(Debug, Clone)]
pub struct ErrorSuppressor {
    failures: u32,
    active: bool,
    suppress_until: Duration,
    short_session: Duration,
    threshold: u32,
    window: Duration,
    reset_failures: u32,
}

impl ErrorSuppressor {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            failures: 0,
            active: false,
            suppress_until: Duration::ZERO,
            short_session: config.short_session_duration(),
            threshold: config.suppression_threshold,
            window: config.suppression_window_duration(),
            reset_failures: config.suppression_reset_failures,
        }
    }

    /// Short-lived sessions counted since the last reset
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether failure messages are currently withheld
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// When the current window ends; zero when inactive
    pub fn suppress_until(&self) -> Duration {
        self.suppress_until
    }

    /// Account for a session that just ended.
    ///
    /// Returns `true` when this session brought the failure count to the
    /// threshold, meaning suppression should be switched on now.
    pub fn record_session(&mut self, duration: Duration) -> bool {
        if duration >= self.short_session {
            return false;
        }
        self.failures = self.failures.saturating_add(1);
        self.failures == self.threshold
    }

    /// Switch suppression on for one window starting at `now`
    pub fn activate(&mut self, now: Duration) {
        self.active = true;
        self.suppress_until = now.saturating_add(self.window);
    }

    /// Switch suppression off and restore the failure count
    pub fn reset(&mut self) {
        self.failures = self.reset_failures;
        self.active = false;
        self.suppress_until = Duration::ZERO;
    }

    /// Clear suppression if its window has passed. Returns `true` if cleared.
    pub fn expire_if_due(&mut self, now: Duration) -> bool {
        if self.active && now > self.suppress_until {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Window length in effect
    pub fn window(&self) -> Duration {
        self.window
    }
}
