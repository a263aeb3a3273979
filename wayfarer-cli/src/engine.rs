//! Wiring from resolved command configuration to a planner.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use wayfarer_core::{
    Clock, OptimizationGoal, OptimizeRequest, Route, RoutePlanner, TrafficAdjuster,
    TrafficConditionCache, TrafficProfile,
};
use wayfarer_data::{EstimatedTravelDataProvider, ScheduledWeatherProvider};
use wayfarer_solver::{OptimizerConfig, RouteOptimizer};

use crate::{ARG_REQUEST, ARG_WEATHER_SCHEDULE, CliError};

/// Planner used by every command.
pub(crate) type CliPlanner = RouteOptimizer<EstimatedTravelDataProvider, ScheduledWeatherProvider>;

/// Inputs shared by `plan` and `watch` after configuration merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EngineConfig {
    /// JSON-encoded [`OptimizeRequest`].
    pub(crate) request_path: Utf8PathBuf,
    /// Optional JSON weather schedule.
    pub(crate) weather_schedule: Option<Utf8PathBuf>,
    /// Largest waypoint count searched exhaustively.
    pub(crate) exact_search_bound: usize,
    /// Weight preset replacing the request's weights.
    pub(crate) goal: Option<OptimizationGoal>,
}

impl EngineConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_file(&self.request_path, ARG_REQUEST)?;
        if let Some(path) = &self.weather_schedule {
            require_file(path, ARG_WEATHER_SCHEDULE)?;
        }
        Ok(())
    }

    /// Build the planner this configuration describes.
    pub(crate) fn planner(&self, clock: Arc<dyn Clock>) -> Result<CliPlanner, CliError> {
        let weather = match &self.weather_schedule {
            Some(path) => ScheduledWeatherProvider::from_path(path)?,
            None => ScheduledWeatherProvider::default(),
        };
        let cache = Arc::new(TrafficConditionCache::with_clock(clock));
        let adjuster = TrafficAdjuster::new(cache, TrafficProfile::default());
        Ok(RouteOptimizer::with_config(
            EstimatedTravelDataProvider::default(),
            weather,
            adjuster,
            OptimizerConfig::default().with_exact_search_bound(self.exact_search_bound),
        ))
    }

    /// Load the request, applying the goal override.
    pub(crate) fn request(&self) -> Result<OptimizeRequest, CliError> {
        let mut request = load_request(&self.request_path)?;
        if let Some(goal) = self.goal {
            request.weights = goal.into();
        }
        request
            .validate()
            .map_err(|source| CliError::InvalidRequest {
                path: self.request_path.clone(),
                source,
            })?;
        Ok(request)
    }
}

fn require_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        })
    }
}

/// Loads a JSON-encoded [`OptimizeRequest`] from disk.
pub(crate) fn load_request(path: &Utf8Path) -> Result<OptimizeRequest, CliError> {
    let file = File::open(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}

/// Plan `request` and log a one-line summary.
pub(crate) fn plan(planner: &CliPlanner, request: &OptimizeRequest) -> Result<Route, CliError> {
    let route = planner.optimize(request).map_err(CliError::Optimize)?;
    let totals = route.totals();
    info!(
        "planned {} leg(s): cost {:.2}, {} min, {:.1} kg CO2e ({:?}{})",
        route.legs().len(),
        totals.cost,
        totals.duration.as_secs() / 60,
        totals.carbon,
        route.method(),
        if route.is_stale() { ", stale" } else { "" },
    );
    Ok(route)
}
