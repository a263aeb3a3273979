//! `plan` command implementation.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfarer_core::{Clock, DisplayConsumer, OptimizationGoal, SystemClock};
use wayfarer_solver::EXACT_SEARCH_BOUND;

use crate::engine::{self, EngineConfig};
use crate::output::JsonDisplay;
use crate::{
    ARG_EXACT_SEARCH_BOUND, ARG_GOAL, ARG_REQUEST, ARG_WEATHER_SCHEDULE, CliError,
    ENV_PLAN_REQUEST,
};

/// CLI arguments for the `plan` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan a route for a JSON-encoded optimisation request. Legs \
                 are estimated from great-circle distance per transport mode; \
                 weather comes from an optional schedule file and is clear \
                 everywhere otherwise. The route is printed as JSON.",
    about = "Plan a route from a JSON request"
)]
#[ortho_config(prefix = "WAYFARER")]
pub(crate) struct PlanArgs {
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
}

impl PlanArgs {
    pub(crate) fn into_config(self) -> Result<EngineConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        EngineConfig::try_from(merged)
    }
}

impl TryFrom<PlanArgs> for EngineConfig {
    type Error = CliError;

    fn try_from(args: PlanArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_REQUEST,
            env: ENV_PLAN_REQUEST,
        })?;
        Ok(Self {
            request_path,
            weather_schedule: args.weather_schedule,
            exact_search_bound: args.exact_search_bound.unwrap_or(EXACT_SEARCH_BOUND),
            goal: args.goal,
        })
    }
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_plan_with(args, Arc::new(SystemClock), &mut stdout)
}

pub(crate) fn run_plan_with(
    args: PlanArgs,
    clock: Arc<dyn Clock>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let request = config.request()?;
    let planner = config.planner(clock)?;
    let route = engine::plan(&planner, &request)?;
    JsonDisplay::new(writer).display(&route)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<EngineConfig, CliError> {
    let merged = PlanArgs::merge_from_layers(layers).map_err(CliError::from)?;
    EngineConfig::try_from(merged)
}
