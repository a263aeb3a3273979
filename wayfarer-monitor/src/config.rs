//! Tunables for route monitoring.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Default time between re-evaluations of a monitored route.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration shared by every session of a [`RouteMonitor`](crate::RouteMonitor).
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use wayfarer_monitor::MonitorConfig;
///
/// let config = MonitorConfig::default()
///     .with_tick_interval(Duration::from_secs(60))
///     .with_alert_threshold(0.1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time between ticks; the first tick fires one interval after start.
    pub tick_interval: Duration,
    /// Relative increase of a leg's duration or cost that counts as a
    /// breach, e.g. `0.2` for 20 %.
    pub alert_threshold: f64,
    /// Consecutive breaching ticks after which a major alert is raised.
    pub escalation_ticks: u32,
    /// Consecutive failed ticks after which data is reported unavailable.
    pub failure_threshold: u32,
    /// Maximum number of re-routing proposals attached to an alert.
    pub proposal_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            alert_threshold: 0.2,
            escalation_ticks: 3,
            failure_threshold: 3,
            proposal_limit: 3,
        }
    }
}

impl MonitorConfig {
    /// Override the tick interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Override the breach threshold.
    #[must_use]
    pub const fn with_alert_threshold(mut self, threshold: f64) -> Self {
        self.alert_threshold = threshold;
        self
    }

    /// Override the escalation tick count.
    #[must_use]
    pub const fn with_escalation_ticks(mut self, ticks: u32) -> Self {
        self.escalation_ticks = ticks;
        self
    }

    /// Override the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, ticks: u32) -> Self {
        self.failure_threshold = ticks;
        self
    }

    /// Override the proposal limit.
    #[must_use]
    pub const fn with_proposal_limit(mut self, limit: usize) -> Self {
        self.proposal_limit = limit;
        self
    }

    /// Reject settings that would make sessions spin or never alert.
    ///
    /// # Errors
    /// Returns [`MonitorError::InvalidConfig`] for a zero interval, a
    /// non-finite or negative threshold, or zero tick counts.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.tick_interval.is_zero() {
            return Err(MonitorError::invalid_config("tick interval must be positive"));
        }
        if !self.alert_threshold.is_finite() || self.alert_threshold < 0.0 {
            return Err(MonitorError::invalid_config(format!(
                "alert threshold must be a finite non-negative ratio, got {}",
                self.alert_threshold
            )));
        }
        if self.escalation_ticks == 0 || self.failure_threshold == 0 {
            return Err(MonitorError::invalid_config(
                "escalation and failure tick counts must be at least one",
            ));
        }
        Ok(())
    }
}
