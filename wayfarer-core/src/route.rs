//! Computed routes and their derived summaries.
//!
//! A [`Route`] is produced by a [`RoutePlanner`](crate::RoutePlanner) and is
//! read-only afterwards: re-planning yields a new value.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::advance;
use crate::leg::minutes;
use crate::{
    AdjustedLeg, Leg, ObjectiveWeights, Pacing, TransportMode, Waypoint, WaypointId,
    WeatherCondition,
};

/// Whether a route returns to its first waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryKind {
    /// Ends at the last waypoint: N waypoints give N−1 legs.
    #[default]
    Open,
    /// Returns to the first waypoint: N waypoints give N legs.
    Closed,
}

impl ItineraryKind {
    /// Number of legs a route over `waypoints` stops has.
    pub const fn leg_count(self, waypoints: usize) -> usize {
        match self {
            Self::Open => waypoints.saturating_sub(1),
            Self::Closed => waypoints,
        }
    }
}

/// How the visiting order was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Exhaustive search; the order is optimal for the objective.
    Exact,
    /// Greedy construction with 2-opt improvement; no optimality guarantee.
    Heuristic,
}

/// Where a leg's base figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegEstimate {
    /// Fresh answer from the travel data provider.
    #[default]
    Live,
    /// Reused from an earlier successful lookup after the provider failed.
    Stale,
    /// Distance-based estimate after the provider timed out.
    Default,
}

/// One leg of a route with the conditions it was evaluated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Base figures.
    pub leg: Leg,
    /// Figures after traffic and weather.
    pub adjusted: AdjustedLeg,
    /// Estimated departure time.
    pub departure: DateTime<Utc>,
    /// Weather assumed at departure.
    pub weather: WeatherCondition,
    /// Provenance of the base figures.
    pub estimate: LegEstimate,
}

impl RouteLeg {
    /// Extra time over the base duration caused by traffic and weather.
    pub const fn delay(&self) -> Duration {
        self.adjusted.delay_over(self.leg.base_duration)
    }
}

/// Sums of adjusted figures over a sequence of legs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteTotals {
    /// Total cost.
    pub cost: f64,
    /// Total door-to-door duration.
    pub duration: Duration,
    /// Total emissions in kg.
    pub carbon: f64,
}

impl RouteTotals {
    /// Totals of `legs`.
    pub fn of<'a>(legs: impl IntoIterator<Item = &'a AdjustedLeg>) -> Self {
        legs.into_iter().fold(Self::default(), |mut acc, leg| {
            acc.add(leg);
            acc
        })
    }

    /// Accumulate one more leg.
    pub fn add(&mut self, leg: &AdjustedLeg) {
        self.cost += leg.cost;
        self.duration = self.duration.saturating_add(leg.duration);
        self.carbon += leg.carbon;
    }

    /// Weighted objective of these totals.
    pub fn objective(&self, weights: &ObjectiveWeights) -> f64 {
        weights.score(self.cost, self.duration, self.carbon)
    }

    /// Overall efficiency from 0 to 100, higher is better.
    ///
    /// Cost is normalised against 1000, duration against 48 hours and carbon
    /// against 1000 kg, then weighted 0.4, 0.4 and 0.2.
    pub fn efficiency_score(&self) -> f64 {
        let cost = (1.0 - self.cost / 1000.0).max(0.0);
        let time = (1.0 - minutes(self.duration) / (48.0 * 60.0)).max(0.0);
        let carbon = (1.0 - self.carbon / 1000.0).max(0.0);
        (cost * 0.4 + time * 0.4 + carbon * 0.2) * 100.0
    }
}

/// Coarse traffic level over a whole route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficStatus {
    /// Up to one hour of cumulative delay.
    Light,
    /// More than one hour of cumulative delay.
    Moderate,
    /// More than two hours of cumulative delay.
    Heavy,
}

impl TrafficStatus {
    /// Status for a cumulative delay.
    pub const fn from_delay(total: Duration) -> Self {
        let secs = total.as_secs();
        if secs > 120 * 60 {
            Self::Heavy
        } else if secs > 60 * 60 {
            Self::Moderate
        } else {
            Self::Light
        }
    }
}

/// Delay statistics over a route's road legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSummary {
    /// Legs subject to traffic.
    pub legs_checked: usize,
    /// Legs whose adjusted duration exceeds the base duration.
    pub legs_delayed: usize,
    /// Sum of per-leg delays.
    pub total_delay: Duration,
    /// Largest single-leg delay.
    pub max_delay: Duration,
    /// Level derived from `total_delay`.
    pub status: TrafficStatus,
}

/// When one leg of a route leaves and arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegTiming {
    /// Estimated departure.
    pub departure: DateTime<Utc>,
    /// Estimated arrival.
    pub arrival: DateTime<Utc>,
    /// Stop at the destination before the next leg; zero after the last.
    pub wait_after: Duration,
}

/// Timetable of a route: per-leg times and the split between moving and
/// waiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryTiming {
    /// Per-leg times in travel order.
    pub legs: Vec<LegTiming>,
    /// Time spent travelling.
    pub travel: Duration,
    /// Time spent at layovers and overnight rests.
    pub waiting: Duration,
}

impl ItineraryTiming {
    /// Departure of the first leg.
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.legs.first().map(|leg| leg.departure)
    }

    /// Arrival of the last leg.
    pub fn arrival(&self) -> Option<DateTime<Utc>> {
        self.legs.last().map(|leg| leg.arrival)
    }

    /// Travel plus waiting.
    pub const fn trip(&self) -> Duration {
        self.travel.saturating_add(self.waiting)
    }
}

/// Errors from [`Route::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Fewer than two waypoints.
    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),
    /// Leg count does not match the itinerary kind.
    #[error("expected {expected} legs, got {actual}")]
    LegCount {
        /// Legs required by the itinerary kind.
        expected: usize,
        /// Legs supplied.
        actual: usize,
    },
    /// A leg does not join consecutive waypoints.
    #[error("leg {index} does not connect consecutive waypoints")]
    Discontinuous {
        /// Offending leg.
        index: usize,
    },
}

/// Ordered visit of waypoints with per-leg figures and totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    legs: Vec<RouteLeg>,
    totals: RouteTotals,
    objective: f64,
    itinerary: ItineraryKind,
    method: SearchMethod,
    pacing: Pacing,
    computed_at: DateTime<Utc>,
}

impl Route {
    /// Assemble a route, deriving totals and the objective from `legs`.
    ///
    /// `legs[i]` must run from `waypoints[i]` to the next waypoint, wrapping
    /// to the first for a closed itinerary.
    pub fn new(
        waypoints: Vec<Waypoint>,
        legs: Vec<RouteLeg>,
        itinerary: ItineraryKind,
        method: SearchMethod,
        weights: &ObjectiveWeights,
        computed_at: DateTime<Utc>,
    ) -> Result<Self, RouteError> {
        let n = waypoints.len();
        if n < 2 {
            return Err(RouteError::TooFewWaypoints(n));
        }
        let expected = itinerary.leg_count(n);
        if legs.len() != expected {
            return Err(RouteError::LegCount {
                expected,
                actual: legs.len(),
            });
        }
        let next = waypoints.iter().cycle().skip(1);
        for (index, ((leg, from), to)) in legs.iter().zip(&waypoints).zip(next).enumerate() {
            if leg.leg.origin.id != from.id || leg.leg.destination.id != to.id {
                return Err(RouteError::Discontinuous { index });
            }
        }
        let totals = RouteTotals::of(legs.iter().map(|leg| &leg.adjusted));
        Ok(Self {
            objective: totals.objective(weights),
            waypoints,
            legs,
            totals,
            itinerary,
            method,
            pacing: Pacing::default(),
            computed_at,
        })
    }

    /// Record the pacing the legs' departures were planned with.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Stops between legs the route was planned with.
    pub const fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Departure, arrival and waiting time of every leg.
    pub fn timing(&self) -> ItineraryTiming {
        let mut timing = ItineraryTiming {
            legs: Vec::with_capacity(self.legs.len()),
            travel: Duration::ZERO,
            waiting: Duration::ZERO,
        };
        let next_departures = self.legs.iter().skip(1).map(|leg| Some(leg.departure));
        for (leg, next) in self.legs.iter().zip(next_departures.chain([None])) {
            let arrival = advance(leg.departure, leg.adjusted.duration);
            let wait_after = next
                .and_then(|departure| (departure - arrival).to_std().ok())
                .unwrap_or(Duration::ZERO);
            timing.travel = timing.travel.saturating_add(leg.adjusted.duration);
            timing.waiting = timing.waiting.saturating_add(wait_after);
            timing.legs.push(LegTiming {
                departure: leg.departure,
                arrival,
                wait_after,
            });
        }
        timing
    }

    /// Waypoints in visiting order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Identifiers in visiting order.
    pub fn waypoint_ids(&self) -> Vec<WaypointId> {
        self.waypoints.iter().map(|w| w.id.clone()).collect()
    }

    /// Legs in travel order.
    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    /// Mode of each leg in travel order.
    pub fn leg_modes(&self) -> Vec<TransportMode> {
        self.legs.iter().map(|leg| leg.leg.mode).collect()
    }

    /// Summed adjusted figures.
    pub const fn totals(&self) -> &RouteTotals {
        &self.totals
    }

    /// Weighted objective the route was chosen by.
    pub const fn objective(&self) -> f64 {
        self.objective
    }

    /// Open or closed.
    pub const fn itinerary(&self) -> ItineraryKind {
        self.itinerary
    }

    /// Exact or heuristic.
    pub const fn method(&self) -> SearchMethod {
        self.method
    }

    /// When the route was computed.
    pub const fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Estimated departure from the first waypoint.
    pub fn departure(&self) -> DateTime<Utc> {
        self.legs
            .first()
            .map_or(self.computed_at, |leg| leg.departure)
    }

    /// Whether any leg reused a remembered base leg after a provider failure.
    pub fn is_stale(&self) -> bool {
        self.legs.iter().any(|leg| leg.estimate == LegEstimate::Stale)
    }

    /// Whether any leg fell back to a distance-based estimate.
    pub fn is_partial(&self) -> bool {
        self.legs
            .iter()
            .any(|leg| leg.estimate == LegEstimate::Default)
    }

    /// Delay statistics over the road-bound legs.
    pub fn traffic_summary(&self) -> TrafficSummary {
        let mut summary = TrafficSummary {
            legs_checked: 0,
            legs_delayed: 0,
            total_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            status: TrafficStatus::Light,
        };
        for leg in self.legs.iter().filter(|leg| leg.leg.mode.is_road_bound()) {
            summary.legs_checked += 1;
            let delay = leg.delay();
            if !delay.is_zero() {
                summary.legs_delayed += 1;
            }
            summary.total_delay = summary.total_delay.saturating_add(delay);
            summary.max_delay = summary.max_delay.max(delay);
        }
        summary.status = TrafficStatus::from_delay(summary.total_delay);
        summary
    }

    /// See [`RouteTotals::efficiency_score`].
    pub fn efficiency_score(&self) -> f64 {
        self.totals.efficiency_score()
    }
}
