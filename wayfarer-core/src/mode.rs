//! Transport modes a leg can be travelled with.
//!
//! # Examples
//! ```
//! use wayfarer_core::TransportMode;
//!
//! assert_eq!(TransportMode::CarRental.as_str(), "car_rental");
//! assert!(TransportMode::Bus.is_road_bound());
//! assert!(!TransportMode::Flight.is_road_bound());
//! ```

use serde::{Deserialize, Serialize};

/// How a leg is travelled.
///
/// Road-bound modes share the road network with other traffic and are
/// subject to peak-hour and weather multipliers. Fixed-guideway and air modes
/// are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Self-driven rental car.
    CarRental,
    /// Scheduled coach or bus.
    Bus,
    /// App-booked shared ride.
    Rideshare,
    /// Metered taxi.
    Taxi,
    /// Rail service.
    Train,
    /// Scheduled flight.
    Flight,
}

impl TransportMode {
    /// Every mode, in tie-breaking order.
    pub const ALL: [Self; 6] = [
        Self::CarRental,
        Self::Bus,
        Self::Rideshare,
        Self::Taxi,
        Self::Train,
        Self::Flight,
    ];

    /// Whether traffic and ground weather affect legs in this mode.
    pub const fn is_road_bound(self) -> bool {
        matches!(self, Self::CarRental | Self::Bus | Self::Rideshare | Self::Taxi)
    }

    /// Whether the fare is fixed at booking regardless of delays.
    pub const fn has_flat_rate_cost(self) -> bool {
        matches!(self, Self::Flight)
    }

    /// Return the mode as a `snake_case` `&str`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CarRental => "car_rental",
            Self::Bus => "bus",
            Self::Rideshare => "rideshare",
            Self::Taxi => "taxi",
            Self::Train => "train",
            Self::Flight => "flight",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "car_rental" | "car" => Ok(Self::CarRental),
            "bus" => Ok(Self::Bus),
            "rideshare" => Ok(Self::Rideshare),
            "taxi" => Ok(Self::Taxi),
            "train" => Ok(Self::Train),
            "flight" => Ok(Self::Flight),
            _ => Err(format!("unknown transport mode '{s}'")),
        }
    }
}
