//! Route planning requests and the planner contract.
//!
//! [`RoutePlanner`] is the seam between the monitor and the optimizer: the
//! monitor only needs to re-evaluate an existing route and to ask for
//! alternatives, never to know how orders are searched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AdjustedLeg, ItineraryKind, LegEstimate, ObjectiveWeights, Pacing, ProviderError, Route,
    RouteEvaluation, RouteTotals, TransportMode, Waypoint, WaypointId, WeatherCondition,
};

/// Parameters for [`RoutePlanner::optimize`].
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use geo::Coord;
/// use wayfarer_core::{ItineraryKind, ObjectiveWeights, OptimizeRequest, Waypoint};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = OptimizeRequest::new(
///     vec![
///         Waypoint::new("a", "A", Coord { x: 0.0, y: 0.0 })?,
///         Waypoint::new("b", "B", Coord { x: 1.0, y: 0.0 })?,
///     ],
///     Utc::now(),
/// )
/// .with_itinerary(ItineraryKind::Closed)
/// .with_weights(ObjectiveWeights::cost_only())
/// .with_fixed_start("a");
/// request.validate()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Stops to visit.
    pub waypoints: Vec<Waypoint>,
    /// Open or closed tour.
    #[serde(default)]
    pub itinerary: ItineraryKind,
    /// Objective weights.
    #[serde(default)]
    pub weights: ObjectiveWeights,
    /// Waypoint the route must start at.
    #[serde(default)]
    pub fixed_start: Option<WaypointId>,
    /// Waypoint the route must end at. Open itineraries only.
    #[serde(default)]
    pub fixed_end: Option<WaypointId>,
    /// Departure from the first waypoint.
    pub departure: DateTime<Utc>,
    /// Modes each leg may use.
    #[serde(default = "all_modes")]
    pub modes: Vec<TransportMode>,
    /// Layovers and daily travel limit between legs.
    #[serde(default)]
    pub pacing: Pacing,
}

fn all_modes() -> Vec<TransportMode> {
    TransportMode::ALL.to_vec()
}

impl OptimizeRequest {
    /// Open itinerary over `waypoints` with balanced weights and every mode.
    pub fn new(waypoints: Vec<Waypoint>, departure: DateTime<Utc>) -> Self {
        Self {
            waypoints,
            itinerary: ItineraryKind::Open,
            weights: ObjectiveWeights::default(),
            fixed_start: None,
            fixed_end: None,
            departure,
            modes: all_modes(),
            pacing: Pacing::default(),
        }
    }

    /// Set the itinerary kind.
    #[must_use]
    pub fn with_itinerary(mut self, itinerary: ItineraryKind) -> Self {
        self.itinerary = itinerary;
        self
    }

    /// Set the objective weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Pin the first waypoint.
    #[must_use]
    pub fn with_fixed_start(mut self, id: impl Into<WaypointId>) -> Self {
        self.fixed_start = Some(id.into());
        self
    }

    /// Pin the last waypoint.
    #[must_use]
    pub fn with_fixed_end(mut self, id: impl Into<WaypointId>) -> Self {
        self.fixed_end = Some(id.into());
        self
    }

    /// Restrict candidate modes.
    #[must_use]
    pub fn with_modes(mut self, modes: impl IntoIterator<Item = TransportMode>) -> Self {
        self.modes = modes.into_iter().collect();
        self
    }

    /// Set layovers and the daily travel limit.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Reject requests no search should run on.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.waypoints.len() < 2 {
            return Err(OptimizeError::invalid(format!(
                "at least two waypoints are required, got {}",
                self.waypoints.len()
            )));
        }
        self.weights
            .validate()
            .map_err(|err| OptimizeError::invalid(err.to_string()))?;
        if self.modes.is_empty() {
            return Err(OptimizeError::invalid("no candidate transport modes"));
        }
        self.pacing.validate().map_err(OptimizeError::invalid)?;
        let mut seen = HashSet::new();
        for waypoint in &self.waypoints {
            waypoint
                .validate()
                .map_err(|err| OptimizeError::invalid(err.to_string()))?;
            if !seen.insert(&waypoint.id) {
                return Err(OptimizeError::invalid(format!(
                    "waypoint id {} appears more than once",
                    waypoint.id
                )));
            }
        }
        for (i, first) in self.waypoints.iter().enumerate() {
            if let Some(second) = self
                .waypoints
                .iter()
                .skip(i + 1)
                .find(|other| first.coincides_with(other))
            {
                return Err(OptimizeError::DuplicateWaypoint {
                    first: first.id.clone(),
                    second: second.id.clone(),
                });
            }
        }
        for (label, pinned) in [("start", &self.fixed_start), ("end", &self.fixed_end)] {
            if let Some(id) = pinned {
                if !seen.contains(id) {
                    return Err(OptimizeError::invalid(format!(
                        "fixed {label} {id} is not one of the waypoints"
                    )));
                }
            }
        }
        if self.itinerary == ItineraryKind::Closed && self.fixed_end.is_some() {
            return Err(OptimizeError::invalid(
                "a closed itinerary ends where it starts; fixed end is not allowed",
            ));
        }
        if let (Some(start), Some(end)) = (&self.fixed_start, &self.fixed_end) {
            if start == end {
                return Err(OptimizeError::invalid(
                    "fixed start and fixed end must differ",
                ));
            }
        }
        Ok(())
    }
}

/// Errors from [`RoutePlanner::optimize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    /// The request cannot be searched.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong.
        reason: String,
    },
    /// Two waypoints share a location.
    #[error("waypoints {first} and {second} share the same location")]
    DuplicateWaypoint {
        /// First of the pair in request order.
        first: WaypointId,
        /// Second of the pair in request order.
        second: WaypointId,
    },
    /// No usable leg could be obtained for a required pair.
    #[error("no usable leg from {origin} to {destination}")]
    OptimizationFailed {
        /// Pair origin.
        origin: WaypointId,
        /// Pair destination.
        destination: WaypointId,
        /// Last provider error seen for the pair.
        #[source]
        source: ProviderError,
    },
}

impl OptimizeError {
    /// Shorthand for [`OptimizeError::InvalidInput`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// One leg's mode changed by a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSubstitution {
    /// Index of the leg in the route.
    pub leg_index: usize,
    /// Mode in the current route.
    pub from: TransportMode,
    /// Proposed mode.
    pub to: TransportMode,
}

/// Advisory alternative to a route whose conditions degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerouteProposal {
    /// Mode changes relative to the current route.
    pub substitutions: Vec<ModeSubstitution>,
    /// Mode of every leg after substitution.
    pub modes: Vec<TransportMode>,
    /// Adjusted totals with the substitutions applied.
    pub totals: RouteTotals,
    /// Weighted objective with the substitutions applied.
    pub objective: f64,
    /// Current adjusted objective minus `objective`; positive means cheaper.
    pub savings: f64,
}

/// One way of making a single journey, ranked against the other modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportOption {
    /// Position in the ranking, starting at 1.
    pub rank: usize,
    /// Mode of the journey.
    pub mode: TransportMode,
    /// Where the base figures came from.
    pub estimate: LegEstimate,
    /// Figures after traffic and weather.
    pub adjusted: AdjustedLeg,
    /// Departure the figures were adjusted for.
    pub departure: DateTime<Utc>,
    /// Weather at the origin at departure.
    pub weather: WeatherCondition,
    /// Weighted objective of the adjusted figures.
    pub objective: f64,
}

/// Cheaper mode for one leg of an existing route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Index of the leg in the route.
    pub leg_index: usize,
    /// Mode in the current route.
    pub from: TransportMode,
    /// Suggested mode.
    pub to: TransportMode,
    /// Adjusted cost saved by switching; always positive.
    pub cost_savings: f64,
    /// Change in adjusted duration, in minutes; negative means faster.
    pub duration_change_minutes: i64,
}

/// Alternatives to a route, whether or not its conditions degraded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteReview {
    /// Whole-route mode substitutions ranked by objective ascending.
    pub proposals: Vec<RerouteProposal>,
    /// Per-leg switches that lower cost, in leg order.
    pub recommendations: Vec<Recommendation>,
    /// Sum of the recommendations' cost savings.
    pub potential_savings: f64,
}

/// Computes and re-evaluates routes.
///
/// Implementations must be `Send + Sync`: the monitor shares one planner
/// between every session and calls it from Tokio's blocking pool.
pub trait RoutePlanner: Send + Sync {
    /// Best-found route for `request`.
    fn optimize(&self, request: &OptimizeRequest) -> Result<Route, OptimizeError>;

    /// Re-adjust `route`'s legs as if departing at `departure`, keeping order
    /// and modes.
    fn evaluate(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<RouteEvaluation, ProviderError>;

    /// Up to `limit` mode substitutions for the legs at `flagged`, ranked by
    /// objective ascending.
    fn propose_alternatives(
        &self,
        route: &Route,
        flagged: &[usize],
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
        limit: usize,
    ) -> Result<Vec<RerouteProposal>, ProviderError>;

    /// Every mode that can make the journey from `origin` to `destination`,
    /// ranked by objective ascending.
    fn transport_options(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<Vec<TransportOption>, OptimizeError>;

    /// Up to `limit` whole-route proposals over every leg plus the cheapest
    /// mode switch per leg.
    fn analyze_alternatives(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
        limit: usize,
    ) -> Result<RouteReview, ProviderError>;
}

impl<T: RoutePlanner + ?Sized> RoutePlanner for std::sync::Arc<T> {
    fn optimize(&self, request: &OptimizeRequest) -> Result<Route, OptimizeError> {
        (**self).optimize(request)
    }

    fn evaluate(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<RouteEvaluation, ProviderError> {
        (**self).evaluate(route, departure, weights)
    }

    fn propose_alternatives(
        &self,
        route: &Route,
        flagged: &[usize],
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
        limit: usize,
    ) -> Result<Vec<RerouteProposal>, ProviderError> {
        (**self).propose_alternatives(route, flagged, departure, weights, limit)
    }

    fn transport_options(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<Vec<TransportOption>, OptimizeError> {
        (**self).transport_options(origin, destination, departure, weights)
    }

    fn analyze_alternatives(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
        limit: usize,
    ) -> Result<RouteReview, ProviderError> {
        (**self).analyze_alternatives(route, departure, weights, limit)
    }
}
