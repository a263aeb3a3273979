//! Command-line interface for planning and watching Wayfarer routes.
//!
//! `wayfarer plan` reads a JSON optimisation request, plans it against
//! distance-based travel estimates and an optional weather schedule, and
//! prints the route as JSON. `wayfarer watch` plans the same way, then
//! monitors the route for a number of ticks and prints every alert as one
//! JSON line.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod engine;
mod error;
mod output;
mod plan;
mod watch;

pub use error::CliError;

use plan::PlanArgs;
use watch::WatchArgs;

const ARG_REQUEST: &str = "request";
const ARG_WEATHER_SCHEDULE: &str = "weather-schedule";
const ARG_EXACT_SEARCH_BOUND: &str = "exact-search-bound";
const ARG_GOAL: &str = "goal";
const ARG_TICKS: &str = "ticks";
const ARG_INTERVAL_SECS: &str = "interval-secs";
const ARG_THRESHOLD: &str = "threshold";
const ENV_PLAN_REQUEST: &str = "WAYFARER_CMDS_PLAN_REQUEST_PATH";
const ENV_WATCH_REQUEST: &str = "WAYFARER_CMDS_WATCH_REQUEST_PATH";

/// Run the Wayfarer CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging(cli.log_level)?;
    match cli.command {
        Command::Plan(args) => plan::run_plan(args),
        Command::Watch(args) => watch::run_watch(args),
    }
}

fn init_logging(level: LevelFilter) -> Result<(), CliError> {
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(CliError::Logging)
}

#[derive(Debug, Parser)]
#[command(
    name = "wayfarer",
    about = "Plan multi-modal routes and watch them for traffic and weather changes",
    version
)]
struct Cli {
    /// Maximum log level (off, error, warn, info, debug, trace).
    #[arg(long = "log-level", global = true, value_name = "level", default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a route and print it as JSON.
    Plan(PlanArgs),
    /// Plan a route, monitor it and print alerts as JSON lines.
    Watch(WatchArgs),
}

#[cfg(test)]
mod tests;
