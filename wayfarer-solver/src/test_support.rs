//! Test-only utilities for `wayfarer-solver`.
//!
//! The helpers in this module are available to unit tests, behavioural
//! tests and benchmarks. They are gated behind the `test-support` feature
//! (and `cfg(test)`).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use wayfarer_core::test_support::{StubWeatherProvider, TableTravelDataProvider, waypoint};
use wayfarer_core::{
    ManualClock, RetryPolicy, TrafficAdjuster, TrafficConditionCache, TrafficProfile,
    TransportMode, Waypoint,
};

use crate::{OptimizerConfig, RouteOptimizer};

/// Optimizer over an in-memory table, as used throughout the tests.
pub type TableOptimizer =
    RouteOptimizer<Arc<TableTravelDataProvider>, Arc<StubWeatherProvider>>;

/// Wednesday 1 May 2024, 12:00 UTC: a weekday outside both rush hours.
#[must_use]
pub fn off_peak() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Adjuster whose cache clock is frozen at `at`.
#[must_use]
pub fn adjuster_at(at: DateTime<Utc>) -> TrafficAdjuster {
    let cache = TrafficConditionCache::with_clock(Arc::new(ManualClock::new(at)));
    TrafficAdjuster::new(Arc::new(cache), TrafficProfile::default())
}

/// Optimizer over `table` in clear weather with instant retries.
#[must_use]
pub fn optimizer(table: Arc<TableTravelDataProvider>) -> TableOptimizer {
    optimizer_with(table, OptimizerConfig::default())
}

/// Optimizer over `table` in clear weather with `config` and instant retries.
#[must_use]
pub fn optimizer_with(
    table: Arc<TableTravelDataProvider>,
    config: OptimizerConfig,
) -> TableOptimizer {
    RouteOptimizer::with_config(
        table,
        Arc::new(StubWeatherProvider::clear()),
        adjuster_at(off_peak()),
        config.with_retry(RetryPolicy::default().with_initial_backoff(Duration::ZERO)),
    )
}

/// Three waypoints `a`, `b`, `c` with train costs AB = 10, BC = 10, AC = 15.
#[must_use]
pub fn abc() -> (Vec<Waypoint>, Arc<TableTravelDataProvider>) {
    let a = waypoint("a", 0.0, 0.0);
    let b = waypoint("b", 1.0, 0.0);
    let c = waypoint("c", 2.0, 0.0);
    let hour = Duration::from_secs(3600);
    let table = TableTravelDataProvider::new()
        .with_symmetric(&a, &b, TransportMode::Train, 10.0, hour, 1.0)
        .with_symmetric(&b, &c, TransportMode::Train, 10.0, hour, 1.0)
        .with_symmetric(&a, &c, TransportMode::Train, 15.0, hour, 1.0);
    (vec![a, b, c], Arc::new(table))
}

/// Symmetric train table over `stops` with the given per-pair costs.
///
/// `cost(i, j)` is called once per unordered pair with `i < j`.
#[must_use]
pub fn symmetric_train_table(
    stops: &[Waypoint],
    mut cost: impl FnMut(usize, usize) -> f64,
) -> TableTravelDataProvider {
    let mut table = TableTravelDataProvider::new();
    for (i, from) in stops.iter().enumerate() {
        for (j, to) in stops.iter().enumerate().skip(i + 1) {
            table = table.with_symmetric(
                from,
                to,
                TransportMode::Train,
                cost(i, j),
                Duration::from_secs(1800),
                0.5,
            );
        }
    }
    table
}

/// `n` waypoints on a line, ids `w00`, `w01`, … in visiting-id order.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "test coordinates are small")]
pub fn line_of(n: usize) -> Vec<Waypoint> {
    (0..n)
        .map(|i| {
            let x = f64::from(u32::try_from(i).unwrap_or(u32::MAX)) * 0.01;
            waypoint(&format!("w{i:02}"), x, 0.0)
        })
        .collect()
}
