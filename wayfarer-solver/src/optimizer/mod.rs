//! `RouteOptimizer`: the default [`RoutePlanner`].
//!
//! Requests are validated, candidate legs are resolved for every pair the
//! search may use, and the order is found exactly up to
//! [`EXACT_SEARCH_BOUND`] waypoints and heuristically above it. The same
//! resolved legs answer single-journey mode rankings and route reviews.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info};
use wayfarer_core::{
    EstimateProfile, ItineraryKind, Leg, LegCostModel, ObjectiveWeights, OptimizeError,
    OptimizeRequest, ProviderError, Recommendation, RerouteProposal, RetryPolicy, Route,
    RouteEvaluation, RouteEvaluator, RouteLeg, RoutePlanner, RouteReview, SearchMethod,
    TrafficAdjuster, TransportMode, TransportOption, TravelDataProvider, Waypoint,
    WeatherProvider,
};

use crate::legs::{LegMemo, LegResolver};
use crate::proposals::{self, LegOptions};
use crate::search::{SCORE_EPSILON, SearchContext, Tour};
use crate::{exact, heuristic};

/// Largest number of waypoints searched exhaustively by default.
///
/// At or below this count every admissible order is examined and the result
/// is optimal; above it the optimizer switches to greedy construction plus
/// 2-opt and marks the route [`SearchMethod::Heuristic`].
pub const EXACT_SEARCH_BOUND: usize = 8;

/// Configuration for [`RouteOptimizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Largest waypoint count searched exhaustively.
    pub exact_search_bound: usize,
    /// Maximum number of 2-opt passes.
    pub two_opt_pass_budget: usize,
    /// Retry policy for provider timeouts.
    pub retry: RetryPolicy,
    /// Distance-based figures used when the provider times out.
    pub estimates: EstimateProfile,
    /// Modes considered when proposing substitutions.
    pub proposal_modes: Vec<TransportMode>,
    /// Upper bound on substitution sets evaluated per proposal request.
    pub max_proposal_combinations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            exact_search_bound: EXACT_SEARCH_BOUND,
            two_opt_pass_budget: 50,
            retry: RetryPolicy::default(),
            estimates: EstimateProfile::default(),
            proposal_modes: TransportMode::ALL.to_vec(),
            max_proposal_combinations: 64,
        }
    }
}

impl OptimizerConfig {
    /// Override the exact-search bound.
    #[must_use]
    pub const fn with_exact_search_bound(mut self, bound: usize) -> Self {
        self.exact_search_bound = bound;
        self
    }

    /// Override the 2-opt pass budget.
    #[must_use]
    pub const fn with_two_opt_pass_budget(mut self, passes: usize) -> Self {
        self.two_opt_pass_budget = passes;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the fallback estimates.
    #[must_use]
    pub fn with_estimates(mut self, estimates: EstimateProfile) -> Self {
        self.estimates = estimates;
        self
    }
}

/// Finds low-objective visiting orders and re-evaluates existing routes.
///
/// The optimizer is generic over its data sources: a travel data provider
/// for base legs and a weather provider for ground conditions. It shares a
/// [`TrafficAdjuster`] (and with it the traffic cache) with any other
/// component built from the same adjuster.
pub struct RouteOptimizer<P, W> {
    model: LegCostModel<P>,
    planning: RouteEvaluator<Arc<W>>,
    checking: RouteEvaluator<Arc<W>>,
    memo: LegMemo,
    config: OptimizerConfig,
}

impl<P, W> RouteOptimizer<P, W>
where
    P: TravelDataProvider,
    W: WeatherProvider,
{
    /// Construct an optimizer using default configuration.
    pub fn new(provider: P, weather: W, adjuster: TrafficAdjuster) -> Self {
        Self::with_config(provider, weather, adjuster, OptimizerConfig::default())
    }

    /// Construct an optimizer with explicit configuration.
    pub fn with_config(
        provider: P,
        weather: W,
        adjuster: TrafficAdjuster,
        config: OptimizerConfig,
    ) -> Self {
        let weather = Arc::new(weather);
        Self {
            model: LegCostModel::with_retry(provider, config.retry),
            planning: RouteEvaluator::lenient(adjuster.clone(), Arc::clone(&weather)),
            checking: RouteEvaluator::strict(adjuster, weather),
            memo: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Shared traffic adjuster.
    pub const fn adjuster(&self) -> &TrafficAdjuster {
        self.planning.adjuster()
    }

    fn now(&self) -> DateTime<Utc> {
        self.adjuster().cache().clock().now()
    }

    fn resolver(&self) -> LegResolver<'_, P> {
        LegResolver {
            model: &self.model,
            memo: &self.memo,
            estimates: &self.config.estimates,
        }
    }

    fn build_route(
        &self,
        request: &OptimizeRequest,
        stops: &[Waypoint],
        ctx: &SearchContext<'_, Arc<W>>,
        tour: &Tour,
        method: SearchMethod,
    ) -> Result<Route, OptimizeError> {
        let waypoints: Vec<Waypoint> = tour
            .order
            .iter()
            .filter_map(|&i| stops.get(i).cloned())
            .collect();
        let legs = tour
            .steps
            .iter()
            .filter_map(|step| {
                ctx.candidates(step.from, step.to)
                    .get(step.choice)
                    .map(|candidate| RouteLeg {
                        leg: candidate.leg.clone(),
                        adjusted: step.evaluated.adjusted,
                        departure: step.evaluated.departure,
                        weather: step.evaluated.weather,
                        estimate: candidate.estimate,
                    })
            })
            .collect();
        Route::new(
            waypoints,
            legs,
            request.itinerary,
            method,
            &request.weights,
            self.now(),
        )
        .map(|route| route.with_pacing(request.pacing))
        .map_err(|err| OptimizeError::invalid(err.to_string()))
    }

    fn leg_options(&self, route: &Route, flagged: &[usize]) -> Vec<LegOptions> {
        let unique: BTreeSet<usize> = flagged.iter().copied().collect();
        unique
            .into_iter()
            .filter_map(|index| route.legs().get(index).map(|leg| (index, &leg.leg)))
            .map(|(index, current)| {
                let alternatives = self
                    .config
                    .proposal_modes
                    .iter()
                    .filter(|&&mode| mode != current.mode)
                    .filter_map(|&mode| {
                        self.model
                            .base_leg(&current.origin, &current.destination, mode)
                            .map_err(|err| {
                                debug!("no {mode} alternative for leg {index}: {err}");
                            })
                            .ok()
                    })
                    .collect();
                LegOptions {
                    index,
                    current: current.clone(),
                    alternatives,
                }
            })
            .collect()
    }
}

/// Whole minutes from `before` to `after`; negative when `after` is shorter.
fn minutes_change(before: std::time::Duration, after: std::time::Duration) -> i64 {
    let signed = |duration| TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
    signed(after)
        .checked_sub(&signed(before))
        .map_or(0, |delta| delta.num_minutes())
}

/// Index of `id` among `stops`.
fn position_of(stops: &[Waypoint], id: Option<&wayfarer_core::WaypointId>) -> Option<usize> {
    id.and_then(|id| stops.iter().position(|stop| &stop.id == id))
}

impl<P, W> RoutePlanner for RouteOptimizer<P, W>
where
    P: TravelDataProvider,
    W: WeatherProvider,
{
    fn optimize(&self, request: &OptimizeRequest) -> Result<Route, OptimizeError> {
        request.validate()?;

        let mut stops = request.waypoints.clone();
        stops.sort_by(|lhs, rhs| lhs.id.cmp(&rhs.id));
        let fixed_start = position_of(&stops, request.fixed_start.as_ref());
        let fixed_end = position_of(&stops, request.fixed_end.as_ref());
        let open = request.itinerary == ItineraryKind::Open;

        let pairs = self.resolver().resolve_all(&stops, &request.modes, |from, to| {
            !(open && (Some(to) == fixed_start || Some(from) == fixed_end))
        })?;

        let ctx = SearchContext::new(
            &pairs,
            &self.planning,
            request.weights,
            request.itinerary,
            request.departure,
            request.pacing,
            stops.len(),
            fixed_start,
            fixed_end,
        );
        let (tour, method) = if stops.len() <= self.config.exact_search_bound {
            (exact::search(&ctx), SearchMethod::Exact)
        } else {
            (
                heuristic::search(&ctx, self.config.two_opt_pass_budget),
                SearchMethod::Heuristic,
            )
        };
        let tour = tour
            .filter(|tour| ctx.respects_pins(&tour.order))
            .ok_or_else(|| OptimizeError::invalid("no feasible visiting order"))?;

        let route = self.build_route(request, &stops, &ctx, &tour, method)?;
        info!(
            "planned {} waypoints ({method:?}) with objective {:.3}{}{}",
            stops.len(),
            route.objective(),
            if route.is_stale() { ", stale" } else { "" },
            if route.is_partial() { ", partial" } else { "" },
        );
        Ok(route)
    }

    fn evaluate(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<RouteEvaluation, ProviderError> {
        self.checking.evaluate_paced(
            route.legs().iter().map(|leg| &leg.leg),
            departure,
            route.pacing(),
            weights,
        )
    }

    #[expect(clippy::float_arithmetic, reason = "savings are objective differences")]
    fn propose_alternatives(
        &self,
        route: &Route,
        flagged: &[usize],
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
        limit: usize,
    ) -> Result<Vec<RerouteProposal>, ProviderError> {
        if limit == 0 || flagged.is_empty() {
            return Ok(Vec::new());
        }
        let current = self.evaluate(route, departure, weights)?;
        let options = self.leg_options(route, flagged);
        let mut proposals = Vec::new();
        for combination in proposals::combinations(&options, self.config.max_proposal_combinations)
        {
            let legs: Vec<Leg> = route
                .legs()
                .iter()
                .enumerate()
                .map(|(index, leg)| {
                    combination
                        .iter()
                        .find(|(replaced, _)| *replaced == index)
                        .map_or_else(|| leg.leg.clone(), |(_, alternative)| alternative.clone())
                })
                .collect();
            let evaluation =
                self.checking
                    .evaluate_paced(&legs, departure, route.pacing(), weights)?;
            proposals.push(RerouteProposal {
                substitutions: proposals::substitutions(&options, &combination),
                modes: legs.iter().map(|leg| leg.mode).collect(),
                totals: evaluation.totals,
                objective: evaluation.objective,
                savings: current.objective - evaluation.objective,
            });
        }
        debug!(
            "evaluated {} substitution set(s) for legs {flagged:?}",
            proposals.len()
        );
        Ok(proposals::rank(proposals, limit))
    }

    fn transport_options(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<Vec<TransportOption>, OptimizeError> {
        weights
            .validate()
            .map_err(|err| OptimizeError::invalid(err.to_string()))?;
        for waypoint in [origin, destination] {
            waypoint
                .validate()
                .map_err(|err| OptimizeError::invalid(err.to_string()))?;
        }
        if origin.id == destination.id {
            return Err(OptimizeError::invalid(
                "origin and destination must be different waypoints",
            ));
        }
        let failed = |source| OptimizeError::OptimizationFailed {
            origin: origin.id.clone(),
            destination: destination.id.clone(),
            source,
        };
        let candidates = self
            .resolver()
            .resolve(origin, destination, &TransportMode::ALL)
            .map_err(failed)?;

        let mut options = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let evaluated = self
                .planning
                .evaluate_leg(&candidate.leg, departure)
                .map_err(failed)?;
            let adjusted = evaluated.adjusted;
            options.push(TransportOption {
                rank: 0,
                mode: candidate.leg.mode,
                estimate: candidate.estimate,
                adjusted,
                departure,
                weather: evaluated.weather,
                objective: weights.score(adjusted.cost, adjusted.duration, adjusted.carbon),
            });
        }
        options.sort_by(|lhs, rhs| lhs.objective.total_cmp(&rhs.objective));
        for (rank, option) in (1..).zip(options.iter_mut()) {
            option.rank = rank;
        }
        debug!(
            "ranked {} mode(s) from {} to {}",
            options.len(),
            origin.id,
            destination.id
        );
        Ok(options)
    }

    #[expect(clippy::float_arithmetic, reason = "savings are cost differences")]
    fn analyze_alternatives(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
        limit: usize,
    ) -> Result<RouteReview, ProviderError> {
        let every_leg: Vec<usize> = (0..route.legs().len()).collect();
        let proposals = self.propose_alternatives(route, &every_leg, departure, weights, limit)?;
        let current = self.evaluate(route, departure, weights)?;

        let mut recommendations = Vec::new();
        for options in self.leg_options(route, &every_leg) {
            let Some(travelled) = current.legs.get(options.index) else {
                continue;
            };
            let mut best: Option<Recommendation> = None;
            for alternative in &options.alternatives {
                let candidate = self.checking.evaluate_leg(alternative, travelled.departure)?;
                let cost_savings = travelled.adjusted.cost - candidate.adjusted.cost;
                if cost_savings > SCORE_EPSILON
                    && best.is_none_or(|chosen| cost_savings > chosen.cost_savings + SCORE_EPSILON)
                {
                    best = Some(Recommendation {
                        leg_index: options.index,
                        from: options.current.mode,
                        to: alternative.mode,
                        cost_savings,
                        duration_change_minutes: minutes_change(
                            travelled.adjusted.duration,
                            candidate.adjusted.duration,
                        ),
                    });
                }
            }
            recommendations.extend(best);
        }
        let potential_savings = recommendations.iter().map(|r| r.cost_savings).sum();
        debug!(
            "reviewed {} leg(s): {} proposal(s), {} recommendation(s)",
            every_leg.len(),
            proposals.len(),
            recommendations.len()
        );
        Ok(RouteReview {
            proposals,
            recommendations,
            potential_savings,
        })
    }
}
