//! Route optimizer for Wayfarer.
//!
//! This crate provides [`RouteOptimizer`], the default implementation of the
//! [`RoutePlanner`](wayfarer_core::RoutePlanner) trait. Given waypoints and
//! objective weights it resolves candidate legs for every pair through a
//! [`LegCostModel`](wayfarer_core::LegCostModel), picks the best transport
//! mode for each leg at its estimated departure time, and searches visiting
//! orders:
//!
//! - up to [`EXACT_SEARCH_BOUND`] waypoints, a depth-first branch-and-bound
//!   search that is optimal and breaks ties by the smallest waypoint-id
//!   sequence;
//! - above it, greedy nearest-neighbour construction refined by 2-opt, with
//!   the route marked [`SearchMethod::Heuristic`](wayfarer_core::SearchMethod).
//!
//! The optimizer also re-evaluates existing routes and proposes mode
//! substitutions for degraded legs, which the monitor relies on.

#![forbid(unsafe_code)]

mod exact;
mod heuristic;
mod legs;
mod optimizer;
mod proposals;
mod search;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use optimizer::{EXACT_SEARCH_BOUND, OptimizerConfig, RouteOptimizer};
