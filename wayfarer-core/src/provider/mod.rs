//! Contracts for the external data sources the engine consults.
//!
//! [`TravelDataProvider`] supplies baseline leg figures and
//! [`WeatherProvider`] supplies ground conditions. Both are synchronous and
//! must be `Send + Sync`: the monitor calls them from Tokio's blocking pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::Coord;

use crate::{Leg, TransportMode, WeatherCondition, Waypoint};

mod error;

pub use error::ProviderError;

/// Source of baseline leg figures.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use geo::Coord;
/// use wayfarer_core::{Leg, ProviderError, TransportMode, TravelDataProvider, Waypoint};
///
/// struct FlatFare;
///
/// impl TravelDataProvider for FlatFare {
///     fn base_leg(
///         &self,
///         origin: &Waypoint,
///         destination: &Waypoint,
///         mode: TransportMode,
///     ) -> Result<Leg, ProviderError> {
///         Ok(Leg::new(
///             origin.clone(),
///             destination.clone(),
///             mode,
///             10.0,
///             Duration::from_secs(600),
///             1.0,
///         ))
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let a = Waypoint::new("a", "A", Coord { x: 0.0, y: 0.0 })?;
/// let b = Waypoint::new("b", "B", Coord { x: 1.0, y: 0.0 })?;
/// let leg = FlatFare.base_leg(&a, &b, TransportMode::Taxi)?;
/// assert_eq!(leg.base_cost, 10.0);
/// # Ok(())
/// # }
/// ```
pub trait TravelDataProvider: Send + Sync {
    /// Baseline figures for travelling `origin → destination` by `mode`.
    ///
    /// Implementations return [`ProviderError::NotFound`] when the mode does
    /// not serve the pair, rather than inventing figures.
    fn base_leg(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        mode: TransportMode,
    ) -> Result<Leg, ProviderError>;
}

/// Source of ground weather conditions.
pub trait WeatherProvider: Send + Sync {
    /// Condition at `location` around `at`.
    fn condition(
        &self,
        location: Coord<f64>,
        at: DateTime<Utc>,
    ) -> Result<WeatherCondition, ProviderError>;
}

impl<T: TravelDataProvider + ?Sized> TravelDataProvider for Arc<T> {
    fn base_leg(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        mode: TransportMode,
    ) -> Result<Leg, ProviderError> {
        (**self).base_leg(origin, destination, mode)
    }
}

impl<T: WeatherProvider + ?Sized> WeatherProvider for Arc<T> {
    fn condition(
        &self,
        location: Coord<f64>,
        at: DateTime<Utc>,
    ) -> Result<WeatherCondition, ProviderError> {
        (**self).condition(location, at)
    }
}
