//! Facade crate for the Wayfarer route engine.
//!
//! This crate re-exports the core domain types and exposes the optimizer,
//! the route monitor and the bundled data sources behind feature flags
//! (`solver`, `monitor` and `data`, all on by default).
//!
//! ```
//! # #[cfg(all(feature = "solver", feature = "data"))]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use geo::Coord;
//! use wayfarer::{
//!     EstimatedTravelDataProvider, OptimizeRequest, RouteOptimizer, RoutePlanner,
//!     ScheduledWeatherProvider, TrafficAdjuster, TrafficConditionCache, TrafficProfile,
//!     Waypoint,
//! };
//!
//! let adjuster = TrafficAdjuster::new(
//!     Arc::new(TrafficConditionCache::new()),
//!     TrafficProfile::default(),
//! );
//! let optimizer = RouteOptimizer::new(
//!     EstimatedTravelDataProvider::default(),
//!     ScheduledWeatherProvider::default(),
//!     adjuster,
//! );
//! let request = OptimizeRequest::new(
//!     vec![
//!         Waypoint::new("louvre", "Louvre", Coord { x: 2.3376, y: 48.8606 })?,
//!         Waypoint::new("orsay", "Orsay", Coord { x: 2.3266, y: 48.8600 })?,
//!     ],
//!     Utc::now(),
//! );
//! let route = optimizer.optimize(&request)?;
//! assert_eq!(route.legs().len(), 1);
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "solver", feature = "data")))]
//! # fn main() {}
//! ```

#![forbid(unsafe_code)]

pub use wayfarer_core::{
    AdjustedLeg, Alert, AlertKind, AlertSeverity, AlertSink, Clock, DisplayConsumer,
    EstimateProfile, ItineraryKind, ItineraryTiming, Leg, LegCostModel, LegEstimate, LegTiming,
    ManualClock, ModeProfile, ModeSubstitution, ObjectiveWeights, OptimizationGoal,
    OptimizeError, OptimizeRequest, Pacing, ProviderError, Recommendation, RerouteProposal,
    RetryPolicy, Route, RouteEvaluation, RouteEvaluator, RouteId, RouteLeg, RoutePlanner,
    RouteReview, RouteTotals, SearchMethod, SystemClock, TrafficAdjuster, TrafficConditionCache,
    TrafficProfile, TrafficStatus, TrafficSummary, TransportMode, TransportOption,
    TravelDataProvider, Waypoint, WaypointError, WaypointId, WeatherCondition, WeatherFactors,
    WeatherProvider,
};

#[cfg(feature = "solver")]
pub use wayfarer_solver::{EXACT_SEARCH_BOUND, OptimizerConfig, RouteOptimizer};

#[cfg(feature = "monitor")]
pub use wayfarer_monitor::{
    ChannelAlertSink, MonitorConfig, MonitorError, MonitorSession, RouteMonitor, SessionState,
};

#[cfg(feature = "data")]
pub use wayfarer_data::{
    EstimatedTravelDataProvider, ScheduleError, ScheduledWeatherProvider, WeatherSchedule,
    WeatherWindow,
};
