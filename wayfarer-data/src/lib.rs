//! Vendor-neutral data sources for the Wayfarer engine.
//!
//! Responsibilities:
//! - Estimate baseline legs from straight-line distance when no live travel
//!   feed is wired in ([`EstimatedTravelDataProvider`]).
//! - Serve weather from a fixed schedule of time windows, optionally loaded
//!   from a JSON file ([`ScheduledWeatherProvider`]).
//!
//! Boundaries:
//! - Do not encode planning or monitoring rules (those live in
//!   `wayfarer-solver` and `wayfarer-monitor`).
//! - Providers are synchronous and never block on I/O once constructed.
//!
//! Invariants:
//! - Thread-safe: every provider is immutable after construction.
//! - No global mutable state.

#![forbid(unsafe_code)]

mod estimated;
mod schedule;

pub use estimated::EstimatedTravelDataProvider;
pub use schedule::{ScheduleError, ScheduledWeatherProvider, WeatherSchedule, WeatherWindow};
