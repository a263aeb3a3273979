//! Alerts raised while monitoring a route.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RerouteProposal;

/// Caller-chosen identifier of a monitored route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// What triggered an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A leg's adjusted duration grew past the threshold.
    DurationIncrease,
    /// A leg's adjusted cost grew past the threshold.
    CostIncrease,
    /// Conditions could not be re-checked for several ticks in a row.
    DataUnavailable,
}

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// First crossing of the threshold.
    Minor,
    /// The breach persisted long enough to escalate.
    Major,
}

/// Notification that a monitored route no longer matches reality.
///
/// Alerts are immutable: a later alert on the same leg supersedes an earlier
/// one rather than editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Route the alert concerns.
    pub route_id: RouteId,
    /// Indices of the legs that crossed the threshold.
    pub leg_indices: Vec<usize>,
    /// Trigger.
    pub kind: AlertKind,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Human-readable summary.
    pub message: String,
    /// Largest relative increase among the flagged legs, e.g. `0.33` for +33 %.
    pub delta: f64,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
    /// Advisory alternatives, best first.
    pub proposals: Vec<RerouteProposal>,
}
