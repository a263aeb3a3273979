//! Core domain types and collaborator contracts for the Wayfarer engine.
//!
//! The crate models waypoints, legs and routes, declares the provider and
//! sink traits the engine talks to, and hosts the leaf components shared by
//! the optimizer and the monitor:
//!
//! - [`LegCostModel`] fetches base legs from a [`TravelDataProvider`],
//!   retrying transient timeouts.
//! - [`TrafficConditionCache`] stores time-bounded multiplier snapshots.
//! - [`TrafficAdjuster`] turns a base [`Leg`] into an [`AdjustedLeg`] for a
//!   departure time and weather condition.
//! - [`RouteEvaluator`] replays a sequence of legs, adjusting each one at
//!   its own departure time as set by the trip's [`Pacing`].
//!
//! Constructors validate their input and return `Result` so invalid data is
//! surfaced before any search runs.

#![forbid(unsafe_code)]

pub mod alert;
pub mod clock;
pub mod estimate;
pub mod evaluate;
pub mod leg;
pub mod leg_cost;
pub mod mode;
pub mod objective;
pub mod pacing;
pub mod planner;
pub mod provider;
pub mod route;
pub mod sink;
mod sync;
pub mod traffic;
pub mod waypoint;
pub mod weather;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use alert::{Alert, AlertKind, AlertSeverity, RouteId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use estimate::{EstimateProfile, ModeProfile};
pub use evaluate::{EvaluatedLeg, RouteEvaluation, RouteEvaluator};
pub use leg::{AdjustedLeg, Leg};
pub use leg_cost::{LegCostModel, RetryPolicy};
pub use mode::TransportMode;
pub use objective::{ObjectiveWeights, OptimizationGoal, WeightsError};
pub use pacing::{Pacing, Progress};
pub use planner::{
    ModeSubstitution, OptimizeError, OptimizeRequest, Recommendation, RerouteProposal,
    RouteReview, RoutePlanner, TransportOption,
};
pub use provider::{ProviderError, TravelDataProvider, WeatherProvider};
pub use route::{
    ItineraryKind, ItineraryTiming, LegEstimate, LegTiming, Route, RouteError, RouteLeg,
    RouteTotals, SearchMethod, TrafficStatus, TrafficSummary,
};
pub use sink::{AlertSink, DisplayConsumer};
pub use traffic::{
    PeakWindow, TrafficAdjuster, TrafficConditionCache, TrafficKey, TrafficProfile,
    TrafficSnapshot, WeatherFactors,
};
pub use waypoint::{Waypoint, WaypointError, WaypointId};
pub use weather::WeatherCondition;
