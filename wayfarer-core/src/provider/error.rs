use thiserror::Error;

use crate::{TransportMode, WaypointId};

/// Errors from [`crate::TravelDataProvider`] and [`crate::WeatherProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider could not be reached or returned garbage.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Human-readable cause.
        message: String,
    },
    /// The provider has no data for this pair under this mode.
    #[error("no {mode} data from {origin} to {destination}")]
    NotFound {
        /// Leg origin.
        origin: WaypointId,
        /// Leg destination.
        destination: WaypointId,
        /// Requested mode.
        mode: TransportMode,
    },
    /// The provider did not answer in time.
    #[error("provider timed out after {timeout_ms} ms")]
    Timeout {
        /// How long the caller waited.
        timeout_ms: u64,
    },
}

impl ProviderError {
    /// Shorthand for [`ProviderError::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
