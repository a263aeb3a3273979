//! Continuous re-validation of planned routes for Wayfarer.
//!
//! A [`RouteMonitor`] keeps one [`MonitorSession`] per registered route. Once
//! started, a session re-evaluates its route on a fixed interval through a
//! [`RoutePlanner`](wayfarer_core::RoutePlanner), compares the route's total
//! duration and cost with the figures captured when it was registered, and
//! raises [`Alert`](wayfarer_core::Alert)s with re-routing proposals for the
//! legs behind any growth past the configured threshold.
//!
//! Sessions move through [`SessionState`]: `Idle → Active ⇄ Alerting`, and
//! `Stopped` from any state. The state machine itself is pure and lives in
//! [`MonitorSession`]; the monitor only schedules it.

#![forbid(unsafe_code)]

mod config;
mod error;
mod monitor;
mod session;
mod sink;

pub use config::{DEFAULT_TICK_INTERVAL, MonitorConfig};
pub use error::MonitorError;
pub use monitor::RouteMonitor;
pub use session::{LegBreach, MonitorSession, PendingAlert, RouteBreach, SessionState};
pub use sink::ChannelAlertSink;
