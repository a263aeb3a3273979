//! Legs: directed travel segments between two waypoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{TransportMode, Waypoint};

/// Baseline figures for travelling from one waypoint to another.
///
/// Produced by a [`TravelDataProvider`](crate::TravelDataProvider) and never
/// mutated afterwards. Cost is in the provider's currency and carbon in
/// kilograms of CO₂-equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// Where the leg starts.
    pub origin: Waypoint,
    /// Where the leg ends.
    pub destination: Waypoint,
    /// How the leg is travelled.
    pub mode: TransportMode,
    /// Fare or running cost with no traffic.
    pub base_cost: f64,
    /// Door-to-door duration with no traffic.
    pub base_duration: Duration,
    /// Emissions with no traffic.
    pub base_carbon: f64,
}

impl Leg {
    /// Construct a leg from its baseline figures.
    pub const fn new(
        origin: Waypoint,
        destination: Waypoint,
        mode: TransportMode,
        base_cost: f64,
        base_duration: Duration,
        base_carbon: f64,
    ) -> Self {
        Self {
            origin,
            destination,
            mode,
            base_cost,
            base_duration,
            base_carbon,
        }
    }

    /// Whether the baseline figures are finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.base_cost.is_finite()
            && self.base_cost >= 0.0
            && self.base_carbon.is_finite()
            && self.base_carbon >= 0.0
    }

    /// Whether this leg connects the same pair as `other`, in the same direction.
    pub fn same_pair(&self, other: &Self) -> bool {
        self.origin.id == other.origin.id && self.destination.id == other.destination.id
    }
}

/// A leg's figures after traffic and weather multipliers were applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedLeg {
    /// Expected door-to-door duration.
    pub duration: Duration,
    /// Expected cost.
    pub cost: f64,
    /// Expected emissions.
    pub carbon: f64,
    /// Factor applied to the base duration and carbon.
    pub duration_multiplier: f64,
    /// Factor applied to the base cost.
    pub cost_multiplier: f64,
}

impl AdjustedLeg {
    /// The leg's base figures with unit multipliers.
    pub const fn unadjusted(leg: &Leg) -> Self {
        Self {
            duration: leg.base_duration,
            cost: leg.base_cost,
            carbon: leg.base_carbon,
            duration_multiplier: 1.0,
            cost_multiplier: 1.0,
        }
    }

    /// Apply the given multipliers to `leg`.
    pub fn scaled(leg: &Leg, duration_multiplier: f64, cost_multiplier: f64) -> Self {
        Self {
            duration: scale_duration(leg.base_duration, duration_multiplier),
            cost: leg.base_cost * cost_multiplier,
            carbon: leg.base_carbon * duration_multiplier,
            duration_multiplier,
            cost_multiplier,
        }
    }

    /// Extra travel time over `base`, or zero when the leg got faster.
    pub const fn delay_over(&self, base: Duration) -> Duration {
        self.duration.saturating_sub(base)
    }
}

/// Multiply a duration, saturating at [`Duration::MAX`] instead of panicking.
pub(crate) fn scale_duration(duration: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Duration in fractional minutes, the unit the objective uses.
pub(crate) fn minutes(duration: Duration) -> f64 {
    duration.as_secs_f64() / 60.0
}
