//! Distance-based leg estimates.
//!
//! Used wherever live provider figures are unavailable: as the default
//! estimate behind partial routes and as the backing table of
//! `wayfarer_data::EstimatedTravelDataProvider`.

use std::time::Duration;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::leg::scale_duration;
use crate::{Leg, TransportMode, Waypoint};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres between two WGS84 coordinates.
pub fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let d_lat = (to.y - from.y).to_radians();
    let d_lon = (to.x - from.x).to_radians();
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();

    let a = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Average performance of one transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Cruising speed in km/h.
    pub speed_kmh: f64,
    /// Cost per kilometre.
    pub cost_per_km: f64,
    /// Kilograms of CO₂-equivalent per kilometre.
    pub carbon_per_km: f64,
    /// Fixed overhead added to every trip (check-in, pickup, boarding).
    pub setup: Duration,
    /// Distances at or below this are not served.
    pub min_km: f64,
    /// Distances at or above this are not served.
    pub max_km: f64,
}

impl ModeProfile {
    /// Whether a trip of `distance_km` falls inside the served range.
    pub fn serves(&self, distance_km: f64) -> bool {
        distance_km > self.min_km && distance_km < self.max_km
    }

    /// Door-to-door duration for `distance_km`.
    pub fn duration_for(&self, distance_km: f64) -> Duration {
        let hours = if self.speed_kmh > 0.0 {
            distance_km / self.speed_kmh
        } else {
            0.0
        };
        self.setup
            .saturating_add(scale_duration(Duration::from_secs(3600), hours))
    }
}

/// Per-mode estimation table.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfarer_core::{EstimateProfile, TransportMode, Waypoint};
///
/// # fn main() -> Result<(), wayfarer_core::WaypointError> {
/// let profile = EstimateProfile::default();
/// let a = Waypoint::new("a", "A", Coord { x: 0.0, y: 0.0 })?;
/// let b = Waypoint::new("b", "B", Coord { x: 1.0, y: 0.0 })?;
/// let leg = profile.estimate_leg(&a, &b, TransportMode::Bus);
/// assert!(leg.base_cost > 0.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateProfile {
    /// Rental car.
    pub car_rental: ModeProfile,
    /// Bus or coach.
    pub bus: ModeProfile,
    /// Shared ride.
    pub rideshare: ModeProfile,
    /// Taxi.
    pub taxi: ModeProfile,
    /// Rail.
    pub train: ModeProfile,
    /// Air.
    pub flight: ModeProfile,
}

impl Default for EstimateProfile {
    fn default() -> Self {
        Self {
            car_rental: ModeProfile {
                speed_kmh: 90.0,
                cost_per_km: 0.12,
                carbon_per_km: 0.171,
                setup: Duration::from_secs(30 * 60),
                min_km: 0.0,
                max_km: 1200.0,
            },
            bus: ModeProfile {
                speed_kmh: 80.0,
                cost_per_km: 0.05,
                carbon_per_km: 0.089,
                setup: Duration::from_secs(30 * 60),
                min_km: 0.0,
                max_km: 800.0,
            },
            rideshare: ModeProfile {
                speed_kmh: 60.0,
                cost_per_km: 1.2,
                carbon_per_km: 0.171,
                setup: Duration::from_secs(10 * 60),
                min_km: 0.0,
                max_km: 150.0,
            },
            taxi: ModeProfile {
                speed_kmh: 60.0,
                cost_per_km: 1.5,
                carbon_per_km: 0.171,
                setup: Duration::from_secs(5 * 60),
                min_km: 0.0,
                max_km: 100.0,
            },
            train: ModeProfile {
                speed_kmh: 120.0,
                cost_per_km: 0.08,
                carbon_per_km: 0.041,
                setup: Duration::from_secs(60 * 60),
                min_km: 50.0,
                max_km: 1000.0,
            },
            flight: ModeProfile {
                speed_kmh: 800.0,
                cost_per_km: 0.15,
                carbon_per_km: 0.255,
                setup: Duration::from_secs(3 * 60 * 60),
                min_km: 100.0,
                max_km: f64::MAX,
            },
        }
    }
}

impl EstimateProfile {
    /// Profile for `mode`.
    pub const fn profile(&self, mode: TransportMode) -> &ModeProfile {
        match mode {
            TransportMode::CarRental => &self.car_rental,
            TransportMode::Bus => &self.bus,
            TransportMode::Rideshare => &self.rideshare,
            TransportMode::Taxi => &self.taxi,
            TransportMode::Train => &self.train,
            TransportMode::Flight => &self.flight,
        }
    }

    /// Replace the profile for `mode`.
    #[must_use]
    pub const fn with_mode(mut self, mode: TransportMode, profile: ModeProfile) -> Self {
        match mode {
            TransportMode::CarRental => self.car_rental = profile,
            TransportMode::Bus => self.bus = profile,
            TransportMode::Rideshare => self.rideshare = profile,
            TransportMode::Taxi => self.taxi = profile,
            TransportMode::Train => self.train = profile,
            TransportMode::Flight => self.flight = profile,
        }
        self
    }

    /// Estimate a leg from straight-line distance, ignoring viability ranges.
    pub fn estimate_leg(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        mode: TransportMode,
    ) -> Leg {
        let distance = haversine_km(origin.location, destination.location);
        let profile = self.profile(mode);
        Leg::new(
            origin.clone(),
            destination.clone(),
            mode,
            distance * profile.cost_per_km,
            profile.duration_for(distance),
            distance * profile.carbon_per_km,
        )
    }
}
