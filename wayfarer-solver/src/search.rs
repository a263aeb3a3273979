//! Incremental evaluation of visiting orders.
//!
//! A [`SearchContext`] turns a sequence of waypoint indices into legs,
//! choosing the best mode for each pair at the moment the traveller would
//! depart once the request's pacing has been applied. Both search strategies
//! share it.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use wayfarer_core::traffic::bucket_of;
use wayfarer_core::{
    EvaluatedLeg, ItineraryKind, ObjectiveWeights, Pacing, Progress, RouteEvaluator,
    WeatherCondition, WeatherProvider,
};

use crate::legs::{Candidate, PairTable};

/// Tolerance when comparing objective values.
pub(crate) const SCORE_EPSILON: f64 = 1.0e-9;

/// One chosen leg of a partial or complete order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step {
    pub(crate) from: usize,
    pub(crate) to: usize,
    /// Index into the pair's candidate list.
    pub(crate) choice: usize,
    pub(crate) evaluated: EvaluatedLeg,
    pub(crate) score: f64,
}

/// A complete order with its legs and objective.
#[derive(Debug, Clone)]
pub(crate) struct Tour {
    pub(crate) order: Vec<usize>,
    pub(crate) steps: Vec<Step>,
    pub(crate) objective: f64,
}

impl Tour {
    /// Whether `self` beats `other` by more than [`SCORE_EPSILON`].
    #[expect(clippy::float_arithmetic, reason = "objective comparison with tolerance")]
    pub(crate) fn improves_on(&self, other: &Self) -> bool {
        self.objective < other.objective - SCORE_EPSILON
    }
}

/// Constraints and shared state for one optimize call.
pub(crate) struct SearchContext<'a, W> {
    pub(crate) pairs: &'a PairTable,
    pub(crate) evaluator: &'a RouteEvaluator<W>,
    pub(crate) weights: ObjectiveWeights,
    pub(crate) itinerary: ItineraryKind,
    pub(crate) departure: DateTime<Utc>,
    pub(crate) pacing: Pacing,
    pub(crate) stop_count: usize,
    pub(crate) fixed_start: Option<usize>,
    pub(crate) fixed_end: Option<usize>,
    weather: RefCell<HashMap<(usize, i64), WeatherCondition>>,
}

impl<'a, W: WeatherProvider> SearchContext<'a, W> {
    #[expect(
        clippy::too_many_arguments,
        reason = "the context bundles every per-call search input"
    )]
    pub(crate) fn new(
        pairs: &'a PairTable,
        evaluator: &'a RouteEvaluator<W>,
        weights: ObjectiveWeights,
        itinerary: ItineraryKind,
        departure: DateTime<Utc>,
        pacing: Pacing,
        stop_count: usize,
        fixed_start: Option<usize>,
        fixed_end: Option<usize>,
    ) -> Self {
        Self {
            pairs,
            evaluator,
            weights,
            itinerary,
            departure,
            pacing,
            stop_count,
            fixed_start,
            fixed_end,
            weather: RefCell::new(HashMap::new()),
        }
    }

    /// Progress before the first leg.
    pub(crate) const fn start(&self) -> Progress {
        self.pacing.start(self.departure)
    }

    /// Progress once `step` has been travelled.
    pub(crate) fn advance(&self, progress: Progress, step: &Step) -> Progress {
        self.pacing.after(progress, &step.evaluated)
    }

    /// Candidate legs for `from → to`.
    pub(crate) fn candidates(&self, from: usize, to: usize) -> &'a [Candidate] {
        self.pairs.candidates(from, to)
    }

    /// Best-scoring leg `from → to` departing at `departure`. Ties keep the
    /// earlier mode.
    pub(crate) fn step(&self, from: usize, to: usize, departure: DateTime<Utc>) -> Option<Step> {
        let mut best: Option<Step> = None;
        for (choice, candidate) in self.candidates(from, to).iter().enumerate() {
            let weather = self.weather_at(from, candidate, departure);
            let adjusted = self
                .evaluator
                .adjuster()
                .adjust(&candidate.leg, departure, weather);
            let score = self
                .weights
                .score(adjusted.cost, adjusted.duration, adjusted.carbon);
            if best.is_none_or(|current| score < current.score) {
                best = Some(Step {
                    from,
                    to,
                    choice,
                    evaluated: EvaluatedLeg {
                        adjusted,
                        departure,
                        weather,
                    },
                    score,
                });
            }
        }
        best
    }

    fn weather_at(
        &self,
        from: usize,
        candidate: &Candidate,
        departure: DateTime<Utc>,
    ) -> WeatherCondition {
        let key = (from, bucket_of(departure));
        if let Some(condition) = self.weather.borrow().get(&key) {
            return *condition;
        }
        // The lenient evaluator never fails; it substitutes clear weather.
        let condition = self
            .evaluator
            .weather_for(&candidate.leg, departure)
            .unwrap_or_default();
        self.weather.borrow_mut().insert(key, condition);
        condition
    }

    /// Legs of `order` travelled in sequence with the pacing's stops between
    /// them, plus the return leg for a closed itinerary. `None` when a pair
    /// has no candidate.
    #[expect(clippy::float_arithmetic, reason = "objective accumulates leg scores")]
    pub(crate) fn tour(&self, order: &[usize]) -> Option<Tour> {
        let mut steps = Vec::with_capacity(order.len());
        let mut progress = self.start();
        let mut objective = 0.0;
        for (from, to) in self.transitions(order) {
            let step = self.step(from, to, progress.departure)?;
            progress = self.advance(progress, &step);
            objective += step.score;
            steps.push(step);
        }
        Some(Tour {
            order: order.to_vec(),
            steps,
            objective,
        })
    }

    /// Consecutive index pairs of `order`, closing the loop when required.
    pub(crate) fn transitions(&self, order: &[usize]) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = order
            .iter()
            .zip(order.iter().skip(1))
            .map(|(&from, &to)| (from, to))
            .collect();
        if self.itinerary == ItineraryKind::Closed
            && let (Some(&last), Some(&first)) = (order.last(), order.first())
            && order.len() > 1
        {
            pairs.push((last, first));
        }
        pairs
    }

    /// Whether `order` honours the fixed start and end.
    pub(crate) fn respects_pins(&self, order: &[usize]) -> bool {
        self.fixed_start.is_none_or(|s| order.first() == Some(&s))
            && self.fixed_end.is_none_or(|e| order.last() == Some(&e))
    }
}
