//! `watch` command implementation.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use log::{debug, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};
use wayfarer_core::{Alert, Clock, OptimizationGoal, RouteId, SystemClock};
use wayfarer_monitor::{ChannelAlertSink, MonitorConfig, RouteMonitor};
use wayfarer_solver::EXACT_SEARCH_BOUND;

use crate::engine::{self, EngineConfig};
use crate::output::write_alert;
use crate::{
    ARG_EXACT_SEARCH_BOUND, ARG_GOAL, ARG_INTERVAL_SECS, ARG_REQUEST, ARG_THRESHOLD, ARG_TICKS,
    ARG_WEATHER_SCHEDULE, CliError, ENV_WATCH_REQUEST,
};

/// Ticks observed when `--ticks` is not given.
const DEFAULT_TICKS: u32 = 3;

/// Slack after the last tick so its alert can still be printed.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// CLI arguments for the `watch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan a route exactly as `plan` does, then re-evaluate it on \
                 a fixed interval. Every alert raised while watching is \
                 printed as one JSON object per line. The command exits after \
                 the requested number of ticks.",
    about = "Monitor a planned route and print alerts"
)]
#[ortho_config(prefix = "WAYFARER")]
pub(crate) struct WatchArgs {
    /// Path to a JSON file containing an optimisation request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Path to a JSON weather schedule.
    #[arg(long = ARG_WEATHER_SCHEDULE, value_name = "path")]
    #[serde(default)]
    pub(crate) weather_schedule: Option<Utf8PathBuf>,
    /// Largest waypoint count searched exhaustively.
    #[arg(long = ARG_EXACT_SEARCH_BOUND, value_name = "count")]
    #[serde(default)]
    pub(crate) exact_search_bound: Option<usize>,
    /// Weight preset (cost, time, carbon, balanced) replacing the request's weights.
    #[arg(long = ARG_GOAL, value_name = "goal")]
    #[serde(default)]
    pub(crate) goal: Option<OptimizationGoal>,
    /// Number of monitoring ticks before exiting.
    #[arg(long = ARG_TICKS, value_name = "count")]
    #[serde(default)]
    pub(crate) ticks: Option<u32>,
    /// Seconds between ticks.
    #[arg(long = ARG_INTERVAL_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) interval_secs: Option<u64>,
    /// Relative increase that flags a leg, e.g. 0.2 for 20 %.
    #[arg(long = ARG_THRESHOLD, value_name = "fraction")]
    #[serde(default)]
    pub(crate) threshold: Option<f64>,
}

impl WatchArgs {
    pub(crate) fn into_config(self) -> Result<WatchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        WatchConfig::try_from(merged)
    }
}

/// Resolved `watch` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WatchConfig {
    pub(crate) engine: EngineConfig,
    pub(crate) ticks: u32,
    pub(crate) monitor: MonitorConfig,
}

impl TryFrom<WatchArgs> for WatchConfig {
    type Error = CliError;

    fn try_from(args: WatchArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_REQUEST,
            env: ENV_WATCH_REQUEST,
        })?;
        let ticks = args.ticks.unwrap_or(DEFAULT_TICKS);
        if ticks == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_TICKS,
                reason: "at least one tick is required".to_owned(),
            });
        }

        let mut monitor = MonitorConfig::default();
        if let Some(secs) = args.interval_secs {
            monitor = monitor.with_tick_interval(Duration::from_secs(secs));
        }
        if let Some(threshold) = args.threshold {
            monitor = monitor.with_alert_threshold(threshold);
        }
        monitor.validate()?;

        Ok(Self {
            engine: EngineConfig {
                request_path,
                weather_schedule: args.weather_schedule,
                exact_search_bound: args.exact_search_bound.unwrap_or(EXACT_SEARCH_BOUND),
                goal: args.goal,
            },
            ticks,
            monitor,
        })
    }
}

pub(crate) fn run_watch(args: WatchArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.engine.validate_sources()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let mut stdout = std::io::stdout().lock();
    let printed = runtime.block_on(watch_with(&config, Arc::new(SystemClock), &mut stdout))?;
    info!("watch finished after {} tick(s), {printed} alert(s)", config.ticks);
    Ok(())
}

/// Plan, monitor for `config.ticks` ticks and print alerts to `writer`.
///
/// Returns the number of alerts printed.
pub(crate) async fn watch_with(
    config: &WatchConfig,
    clock: Arc<dyn Clock>,
    writer: &mut dyn Write,
) -> Result<usize, CliError> {
    let request = config.engine.request()?;
    let planner = Arc::new(config.engine.planner(Arc::clone(&clock))?);
    let route = engine::plan(&planner, &request)?;

    let (sink, mut alerts) = ChannelAlertSink::channel();
    let monitor = RouteMonitor::with_config(planner, sink, clock, config.monitor.clone())?;
    let id = RouteId::new(config.engine.request_path.file_stem().unwrap_or("route"));
    monitor.register(id.clone(), route, request.weights)?;
    monitor.start(&id)?;

    let deadline = Instant::now()
        + config.monitor.tick_interval.saturating_mul(config.ticks)
        + DRAIN_GRACE;
    let until_deadline = sleep_until(deadline);
    tokio::pin!(until_deadline);

    let mut printed = 0_usize;
    let outcome = loop {
        tokio::select! {
            received = alerts.recv() => match received {
                Some(alert) => {
                    if let Err(err) = write_alert(writer, &alert) {
                        break Err(err);
                    }
                    printed += 1;
                }
                None => break Ok(()),
            },
            () = &mut until_deadline => break Ok(()),
        }
    };
    monitor.shutdown().await;
    outcome?;
    // Ticks finishing during shutdown still publish before their task exits.
    Ok(printed + drain_pending(&mut alerts, writer)?)
}

/// Print every alert already queued on `alerts` without waiting for more.
pub(crate) fn drain_pending(
    alerts: &mut UnboundedReceiver<Alert>,
    writer: &mut dyn Write,
) -> Result<usize, CliError> {
    let mut printed = 0;
    while let Ok(alert) = alerts.try_recv() {
        write_alert(writer, &alert)?;
        printed += 1;
    }
    if printed > 0 {
        debug!("printed {printed} alert(s) raised during shutdown");
    }
    Ok(printed)
}
