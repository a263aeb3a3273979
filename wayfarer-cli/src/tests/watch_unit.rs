//! Unit tests for `watch` configuration and the alert stream.

use std::time::Duration;

use super::helpers::{Workspace, manual_clock, paris_request, taxi_only};
use super::*;
use crate::engine::EngineConfig;
use crate::watch::{WatchArgs, WatchConfig, drain_pending, watch_with};
use camino::Utf8PathBuf;
use chrono::Utc;
use rstest::rstest;
use wayfarer_core::{Alert, AlertKind, AlertSeverity, AlertSink, RouteId};
use wayfarer_monitor::{ChannelAlertSink, MonitorConfig, MonitorError};
use wayfarer_solver::EXACT_SEARCH_BOUND;

fn watch_args() -> WatchArgs {
    WatchArgs {
        request_path: Some(Utf8PathBuf::from("trip.json")),
        ..WatchArgs::default()
    }
}

fn watch_config(workspace: &Workspace, weather: Option<Utf8PathBuf>) -> WatchConfig {
    WatchConfig {
        engine: EngineConfig {
            request_path: workspace.write_request(&taxi_only(paris_request())),
            weather_schedule: weather,
            exact_search_bound: EXACT_SEARCH_BOUND,
            goal: None,
        },
        ticks: 2,
        monitor: MonitorConfig::default()
            .with_tick_interval(Duration::from_secs(60))
            .with_alert_threshold(0.1),
    }
}

#[rstest]
fn watch_config_fills_defaults() {
    let config = WatchConfig::try_from(watch_args()).expect("config should build");
    assert_eq!(config.ticks, 3);
    assert_eq!(config.monitor, MonitorConfig::default());
    assert_eq!(config.engine.exact_search_bound, EXACT_SEARCH_BOUND);
}

#[rstest]
fn watch_without_request_names_its_env_var() {
    match WatchConfig::try_from(WatchArgs::default()).expect_err("missing request") {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_REQUEST);
            assert_eq!(env, ENV_WATCH_REQUEST);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn zero_ticks_are_rejected() {
    let args = WatchArgs {
        ticks: Some(0),
        ..watch_args()
    };
    match WatchConfig::try_from(args).expect_err("zero ticks") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_TICKS),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
#[case::negative_threshold(None, Some(-0.5))]
#[case::zero_interval(Some(0), None)]
fn monitor_settings_are_validated(#[case] interval_secs: Option<u64>, #[case] threshold: Option<f64>) {
    let args = WatchArgs {
        interval_secs,
        threshold,
        ..watch_args()
    };
    match WatchConfig::try_from(args).expect_err("invalid monitor settings") {
        CliError::Monitor(MonitorError::InvalidConfig { .. }) => {}
        other => panic!("expected InvalidConfig, found {other:?}"),
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn rain_during_the_watch_prints_one_alert() {
    let workspace = Workspace::new();
    let config = watch_config(&workspace, Some(workspace.write_rain_at_noon()));
    let mut stdout = Vec::new();

    let printed = watch_with(&config, manual_clock(12), &mut stdout)
        .await
        .expect("watch succeeds");

    assert_eq!(printed, 1);
    let text = String::from_utf8(stdout).expect("utf-8 output");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    let alert: Alert = serde_json::from_str(lines.first().expect("one line")).expect("alert JSON");
    assert_eq!(alert.route_id, RouteId::new("request"));
    assert_eq!(alert.severity, AlertSeverity::Minor);
    assert!(!alert.leg_indices.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn steady_conditions_print_nothing() {
    let workspace = Workspace::new();
    let config = watch_config(&workspace, None);
    let mut stdout = Vec::new();

    let printed = watch_with(&config, manual_clock(12), &mut stdout)
        .await
        .expect("watch succeeds");

    assert_eq!(printed, 0);
    assert!(stdout.is_empty());
}

fn late_alert(severity: AlertSeverity) -> Alert {
    Alert {
        route_id: RouteId::new("request"),
        leg_indices: vec![0],
        kind: AlertKind::DurationIncrease,
        severity,
        message: "raised while stopping".to_owned(),
        delta: 0.5,
        timestamp: Utc::now(),
        proposals: Vec::new(),
    }
}

#[rstest]
fn alerts_queued_at_shutdown_are_still_printed() {
    let (sink, mut alerts) = ChannelAlertSink::channel();
    sink.publish(late_alert(AlertSeverity::Minor));
    sink.publish(late_alert(AlertSeverity::Major));
    drop(sink);
    let mut stdout = Vec::new();

    let printed = drain_pending(&mut alerts, &mut stdout).expect("drain succeeds");

    assert_eq!(printed, 2);
    let text = String::from_utf8(stdout).expect("utf-8 output");
    let severities: Vec<AlertSeverity> = text
        .lines()
        .map(|line| serde_json::from_str::<Alert>(line).expect("alert JSON").severity)
        .collect();
    assert_eq!(severities, [AlertSeverity::Minor, AlertSeverity::Major]);
}

#[rstest]
fn draining_an_empty_channel_prints_nothing() {
    let (_sink, mut alerts) = ChannelAlertSink::channel();
    let mut stdout = Vec::new();
    assert_eq!(drain_pending(&mut alerts, &mut stdout).expect("drain succeeds"), 0);
    assert!(stdout.is_empty());
}
