//! Tunables for reconnect scheduling and error suppression
//!
//! All durations are expressed in seconds so the configuration reads naturally
//! from TOML:
//!
//! ```toml
//! [reconnect]
//! reconnect_interval = 10.0
//! reconnect_jitter = 4.0
//! suppression_window = 900.0
//! ```

use crate::error::ReconnectError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`ReconnectingConnection`](crate::ReconnectingConnection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Base spacing between full resolution cycles, measured from the last attempt
    pub reconnect_interval: f64,

    /// Upper bound of the uniform jitter added to the base spacing
    pub reconnect_jitter: f64,

    /// Floor for the delay after all candidates are exhausted.
    /// Delays below twice this value are redrawn from `[min, 2 * min)`.
    pub min_reconnect_delay: f64,

    /// Pause before trying the next resolved candidate
    pub address_fallback_delay: f64,

    /// Sessions shorter than this count as failures
    pub short_session: f64,

    /// Failure count at which log suppression switches on
    pub suppression_threshold: u32,

    /// How long suppression lasts once switched on
    pub suppression_window: f64,

    /// Failure count restored when suppression is cleared
    pub suppression_reset_failures: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: 10.0,
            reconnect_jitter: 4.0,
            min_reconnect_delay: 2.0,
            address_fallback_delay: 0.5,
            short_session: 300.0,
            suppression_threshold: 3,
            suppression_window: 900.0,
            suppression_reset_failures: 2,
        }
    }
}

impl ReconnectConfig {
    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ReconnectError> {
        let positive = [
            ("reconnect_interval", self.reconnect_interval),
            ("min_reconnect_delay", self.min_reconnect_delay),
            ("address_fallback_delay", self.address_fallback_delay),
            ("short_session", self.short_session),
            ("suppression_window", self.suppression_window),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ReconnectError::Config(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }

        if !self.reconnect_jitter.is_finite() || self.reconnect_jitter < 0.0 {
            return Err(ReconnectError::Config(format!(
                "reconnect_jitter must not be negative, got {}",
                self.reconnect_jitter
            )));
        }

        // every delay the scheduler can produce must fit in a Duration
        let spans = [
            ("reconnect_interval", self.reconnect_interval),
            ("reconnect_jitter", self.reconnect_jitter),
            ("address_fallback_delay", self.address_fallback_delay),
            ("short_session", self.short_session),
            ("suppression_window", self.suppression_window),
            (
                "reconnect_interval + reconnect_jitter",
                self.reconnect_interval + self.reconnect_jitter,
            ),
            ("2 * min_reconnect_delay", 2.0 * self.min_reconnect_delay),
        ];
        for (name, value) in spans {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ReconnectError::Config(format!(
                    "{} is too large to represent as a duration, got {}",
                    name, value
                )));
            }
        }

        if self.suppression_threshold == 0 {
            return Err(ReconnectError::Config(
                "suppression_threshold must be at least 1".to_string(),
            ));
        }

        if self.suppression_reset_failures >= self.suppression_threshold {
            return Err(ReconnectError::Config(format!(
                "suppression_reset_failures ({}) must be below suppression_threshold ({})",
                self.suppression_reset_failures, self.suppression_threshold
            )));
        }

        Ok(())
    }

    pub fn short_session_duration(&self) -> Duration {
        Duration::from_secs_f64(self.short_session)
    }

    pub fn suppression_window_duration(&self) -> Duration {
        Duration::from_secs_f64(self.suppression_window)
    }

    pub fn address_fallback_duration(&self) -> Duration {
        Duration::from_secs_f64(self.address_fallback_delay)
    }
}
