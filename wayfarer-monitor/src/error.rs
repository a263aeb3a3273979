//! Errors raised by the route monitor.

use thiserror::Error;
use wayfarer_core::RouteId;

use crate::SessionState;

/// Errors from [`RouteMonitor`](crate::RouteMonitor) session management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// A session already exists for the route id.
    #[error("route {0} is already registered")]
    AlreadyRegistered(RouteId),
    /// No session exists for the route id.
    #[error("route {0} is not registered")]
    UnknownRoute(RouteId),
    /// The requested transition is not allowed from the current state.
    #[error("route {route_id} cannot {action} while {state}")]
    InvalidTransition {
        /// Session concerned.
        route_id: RouteId,
        /// Attempted operation.
        action: &'static str,
        /// State the session was in.
        state: SessionState,
    },
    /// Sessions can only be started from inside a Tokio runtime.
    #[error("no Tokio runtime is available to run route {0}")]
    NoRuntime(RouteId),
    /// The configuration cannot drive a session.
    #[error("invalid monitor configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}

impl MonitorError {
    /// Shorthand for [`MonitorError::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
