//! End-to-end tests for `RouteMonitor` on a paused Tokio clock.
//!
//! Routes are planned by the real optimizer over an in-memory table. Wall
//! time for traffic purposes is pinned to a Wednesday noon by a manual clock,
//! while Tokio's paused clock drives the tick schedule.

#![expect(
    clippy::expect_used,
    reason = "tests use expect for readable failures"
)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};
use wayfarer_core::test_support::{
    RecordingAlertSink, StubWeatherProvider, TableTravelDataProvider, waypoint,
};
use wayfarer_core::{
    AlertKind, AlertSeverity, Clock, ManualClock, ObjectiveWeights, OptimizeRequest,
    ProviderError, Route, RouteId, RoutePlanner, TrafficAdjuster, TrafficConditionCache,
    TrafficProfile, TransportMode, WeatherCondition, WeatherFactors,
};
use wayfarer_monitor::{MonitorConfig, MonitorError, RouteMonitor, SessionState};
use wayfarer_solver::RouteOptimizer;

const TICK: Duration = Duration::from_secs(5 * 60);
const SETTLE: Duration = Duration::from_secs(1);

type Planner = RouteOptimizer<Arc<TableTravelDataProvider>, Arc<StubWeatherProvider>>;
type Monitor = RouteMonitor<Arc<Planner>, Arc<RecordingAlertSink>>;

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

struct Harness {
    clock: Arc<ManualClock>,
    weather: Arc<StubWeatherProvider>,
    planner: Arc<Planner>,
    sink: Arc<RecordingAlertSink>,
    route: Route,
    id: RouteId,
}

impl Harness {
    fn monitor(&self) -> Monitor {
        self.monitor_with(MonitorConfig::default())
    }

    fn monitor_with(&self, config: MonitorConfig) -> Monitor {
        let clock: Arc<dyn Clock> = self.clock.clone();
        RouteMonitor::with_config(
            Arc::clone(&self.planner),
            Arc::clone(&self.sink),
            clock,
            config,
        )
        .expect("valid monitor config")
    }

    fn register(&self, monitor: &Monitor) {
        monitor
            .register(self.id.clone(), self.route.clone(), ObjectiveWeights::default())
            .expect("fresh route registers");
    }
}

#[expect(clippy::float_arithmetic, reason = "rain factor of four thirds")]
fn rainy_profile() -> TrafficProfile {
    TrafficProfile::default().with_weather(WeatherFactors {
        rain: 4.0 / 3.0,
        ..WeatherFactors::default()
    })
}

/// A taxi from `a` to `b` planned at 30 minutes in clear weather. Rain
/// stretches it to 40 minutes; a train alternative is always available.
#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(noon()));
    let cache = TrafficConditionCache::with_clock(clock.clone());
    let adjuster = TrafficAdjuster::new(Arc::new(cache), rainy_profile());

    let a = waypoint("a", 0.0, 0.0);
    let b = waypoint("b", 0.2, 0.0);
    let table = TableTravelDataProvider::new()
        .with_symmetric(
            &a,
            &b,
            TransportMode::Taxi,
            30.0,
            Duration::from_secs(30 * 60),
            3.0,
        )
        .with_symmetric(
            &a,
            &b,
            TransportMode::Train,
            40.0,
            Duration::from_secs(45 * 60),
            1.0,
        );
    let weather = Arc::new(StubWeatherProvider::clear());
    let planner = Arc::new(RouteOptimizer::new(
        Arc::new(table),
        Arc::clone(&weather),
        adjuster,
    ));
    let route = planner
        .optimize(
            &OptimizeRequest::new(vec![a, b], noon())
                .with_fixed_start("a")
                .with_modes([TransportMode::Taxi]),
        )
        .expect("taxi route plans");
    assert_eq!(
        route.legs().first().map(|leg| leg.adjusted.duration),
        Some(Duration::from_secs(30 * 60))
    );

    Harness {
        clock,
        weather,
        planner,
        sink: Arc::new(RecordingAlertSink::new()),
        route,
        id: RouteId::new("trip"),
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slower_leg_alerts_once_then_stays_quiet(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);
    monitor.start(&harness.id).expect("idle session starts");
    harness.weather.set(WeatherCondition::Rain);

    tokio::time::sleep(TICK + SETTLE).await;
    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    let alert = alerts.first().expect("one alert");
    assert_eq!(alert.route_id, harness.id);
    assert_eq!(alert.leg_indices, vec![0]);
    assert_eq!(alert.severity, AlertSeverity::Minor);
    assert_ne!(alert.kind, AlertKind::DataUnavailable);
    assert!(alert.delta > 0.33 && alert.delta < 0.34);
    assert_eq!(alert.timestamp, noon());
    let proposal = alert.proposals.first().expect("train alternative");
    assert_eq!(proposal.modes, vec![TransportMode::Train]);
    assert!(proposal.savings > 0.0);
    assert_eq!(monitor.state(&harness.id), Some(SessionState::Alerting));

    tokio::time::sleep(TICK).await;
    assert_eq!(harness.sink.len(), 1);

    monitor.stop(&harness.id).await.expect("stop succeeds");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn persistent_breach_escalates(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);
    harness.weather.set(WeatherCondition::Rain);
    monitor.start(&harness.id).expect("idle session starts");

    tokio::time::sleep(TICK * 3 + SETTLE).await;
    let severities: Vec<AlertSeverity> = harness
        .sink
        .alerts()
        .iter()
        .map(|alert| alert.severity)
        .collect();
    assert_eq!(severities, vec![AlertSeverity::Minor, AlertSeverity::Major]);

    monitor.shutdown().await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn clearing_weather_returns_to_active(harness: Harness) {
    let monitor = harness.monitor();
    let mut states = monitor
        .register(harness.id.clone(), harness.route.clone(), ObjectiveWeights::default())
        .expect("fresh route registers");
    monitor.start(&harness.id).expect("idle session starts");
    harness.weather.set(WeatherCondition::Rain);

    tokio::time::sleep(TICK + SETTLE).await;
    assert_eq!(*states.borrow_and_update(), SessionState::Alerting);

    harness.weather.set(WeatherCondition::Clear);
    tokio::time::sleep(TICK).await;
    assert_eq!(*states.borrow_and_update(), SessionState::Active);
    assert_eq!(harness.sink.len(), 1);

    monitor.stop(&harness.id).await.expect("stop succeeds");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn nothing_happens_after_stop(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);
    monitor.start(&harness.id).expect("idle session starts");
    tokio::time::sleep(TICK + SETTLE).await;
    assert!(harness.sink.is_empty());

    monitor.stop(&harness.id).await.expect("stop succeeds");
    monitor.stop(&harness.id).await.expect("stop is idempotent");
    harness.weather.set(WeatherCondition::Storm);
    tokio::time::sleep(TICK * 4).await;

    assert!(harness.sink.is_empty());
    assert_eq!(monitor.state(&harness.id), Some(SessionState::Stopped));
    let session = monitor.session(&harness.id).expect("session kept until deregistered");
    assert_eq!(session.last_check(), Some(noon()));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn idle_sessions_never_alert(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);
    harness.weather.set(WeatherCondition::Storm);

    tokio::time::sleep(TICK * 5).await;

    assert!(harness.sink.is_empty());
    assert_eq!(monitor.state(&harness.id), Some(SessionState::Idle));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn repeated_failures_report_data_unavailable_once(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);
    harness
        .weather
        .fail(ProviderError::unavailable("weather feed offline"));
    monitor.start(&harness.id).expect("idle session starts");

    tokio::time::sleep(TICK * 2 + SETTLE).await;
    assert!(harness.sink.is_empty());

    tokio::time::sleep(TICK * 3).await;
    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    let alert = alerts.first().expect("one alert");
    assert_eq!(alert.kind, AlertKind::DataUnavailable);
    assert!(alert.leg_indices.is_empty());
    assert_eq!(monitor.state(&harness.id), Some(SessionState::Active));
    let session = monitor.session(&harness.id).expect("registered");
    assert_eq!(session.failure_ticks(), 5);

    monitor.stop(&harness.id).await.expect("stop succeeds");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn custom_interval_controls_the_first_tick(harness: Harness) {
    let monitor = harness.monitor_with(
        MonitorConfig::default().with_tick_interval(Duration::from_secs(60)),
    );
    harness.register(&monitor);
    harness.weather.set(WeatherCondition::Rain);
    monitor.start(&harness.id).expect("idle session starts");

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert!(harness.sink.is_empty());
    tokio::time::sleep(SETTLE * 2).await;
    assert_eq!(harness.sink.len(), 1);

    monitor.stop(&harness.id).await.expect("stop succeeds");
}

#[rstest]
#[tokio::test]
async fn session_bookkeeping_is_enforced(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);

    let duplicate = monitor.register(
        harness.id.clone(),
        harness.route.clone(),
        ObjectiveWeights::default(),
    );
    assert_eq!(
        duplicate.err(),
        Some(MonitorError::AlreadyRegistered(harness.id.clone()))
    );

    let unknown = RouteId::new("elsewhere");
    assert_eq!(
        monitor.start(&unknown),
        Err(MonitorError::UnknownRoute(unknown.clone()))
    );

    monitor.start(&harness.id).expect("idle session starts");
    assert!(matches!(
        monitor.start(&harness.id),
        Err(MonitorError::InvalidTransition { .. })
    ));
    assert!(matches!(
        monitor.deregister(&harness.id),
        Err(MonitorError::InvalidTransition { .. })
    ));
    assert_eq!(
        monitor.sessions(),
        vec![(harness.id.clone(), SessionState::Active)]
    );

    monitor.shutdown().await;
    monitor.deregister(&harness.id).expect("stopped session deregisters");
    assert!(monitor.sessions().is_empty());
    assert_eq!(monitor.state(&harness.id), None);
}

#[rstest]
fn starting_outside_a_runtime_fails(harness: Harness) {
    let monitor = harness.monitor();
    harness.register(&monitor);
    assert_eq!(
        monitor.start(&harness.id),
        Err(MonitorError::NoRuntime(harness.id.clone()))
    );
    assert_eq!(monitor.state(&harness.id), Some(SessionState::Idle));
}
