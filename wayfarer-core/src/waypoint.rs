//! Waypoints: identified, geolocated stops on a trip.

use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest per-axis coordinate difference, in degrees, at which two waypoints
/// are considered the same place.
pub const COORDINATE_EPSILON: f64 = 1.0e-9;

/// Stable identifier of a [`Waypoint`].
///
/// Identifiers order lexicographically; the optimizer relies on this ordering
/// to break ties between equally good visiting orders.
///
/// # Examples
/// ```
/// use wayfarer_core::WaypointId;
///
/// let id = WaypointId::new("paris");
/// assert_eq!(id.as_str(), "paris");
/// assert!(WaypointId::new("a") < WaypointId::new("b"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointId(String);

impl WaypointId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WaypointId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WaypointId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A location to be visited.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfarer_core::Waypoint;
///
/// # fn main() -> Result<(), wayfarer_core::WaypointError> {
/// let paris = Waypoint::new("paris", "Paris", Coord { x: 2.3522, y: 48.8566 })?;
/// assert_eq!(paris.id.as_str(), "paris");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Unique identifier.
    pub id: WaypointId,
    /// Human-readable name.
    pub name: String,
    /// Geospatial position.
    pub location: Coord<f64>,
}

/// Errors returned by [`Waypoint::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaypointError {
    /// The identifier was blank.
    #[error("waypoint id must not be empty")]
    EmptyId,
    /// A coordinate was NaN or infinite.
    #[error("waypoint {id} has a non-finite coordinate")]
    NonFiniteLocation {
        /// Offending waypoint.
        id: WaypointId,
    },
    /// Longitude or latitude fell outside the WGS84 range.
    #[error("waypoint {id} lies outside the valid longitude/latitude range")]
    OutOfRange {
        /// Offending waypoint.
        id: WaypointId,
    },
}

impl Waypoint {
    /// Validate and construct a waypoint.
    pub fn new(
        id: impl Into<WaypointId>,
        name: impl Into<String>,
        location: Coord<f64>,
    ) -> Result<Self, WaypointError> {
        let waypoint = Self {
            id: id.into(),
            name: name.into(),
            location,
        };
        waypoint.validate()?;
        Ok(waypoint)
    }

    /// Check the invariants enforced by [`Waypoint::new`].
    ///
    /// Deserialised waypoints bypass the constructor, so consumers call this
    /// before trusting external input.
    pub fn validate(&self) -> Result<(), WaypointError> {
        if self.id.as_str().trim().is_empty() {
            return Err(WaypointError::EmptyId);
        }
        if !self.location.x.is_finite() || !self.location.y.is_finite() {
            return Err(WaypointError::NonFiniteLocation {
                id: self.id.clone(),
            });
        }
        if !(-180.0..=180.0).contains(&self.location.x) || !(-90.0..=90.0).contains(&self.location.y)
        {
            return Err(WaypointError::OutOfRange {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Whether `other` sits at the same place within [`COORDINATE_EPSILON`].
    pub fn coincides_with(&self, other: &Self) -> bool {
        (self.location.x - other.location.x).abs() <= COORDINATE_EPSILON
            && (self.location.y - other.location.y).abs() <= COORDINATE_EPSILON
    }
}
