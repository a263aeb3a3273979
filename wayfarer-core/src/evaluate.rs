//! Sequential evaluation of leg chains.
//!
//! Each leg departs when the previous one arrives plus whatever stop the
//! trip's [`Pacing`] asks for, so traffic and weather are sampled at the
//! leg's own estimated departure time.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::clock::advance;
use crate::{
    AdjustedLeg, Leg, ObjectiveWeights, Pacing, ProviderError, RouteTotals, TrafficAdjuster,
    WeatherCondition, WeatherProvider,
};

/// A leg adjusted at its estimated departure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedLeg {
    /// Figures after traffic and weather.
    pub adjusted: AdjustedLeg,
    /// Estimated departure time.
    pub departure: DateTime<Utc>,
    /// Weather assumed at departure.
    pub weather: WeatherCondition,
}

impl EvaluatedLeg {
    /// Estimated arrival time.
    pub fn arrival(&self) -> DateTime<Utc> {
        advance(self.departure, self.adjusted.duration)
    }
}

/// Result of evaluating a chain of legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEvaluation {
    /// Per-leg results in travel order.
    pub legs: Vec<EvaluatedLeg>,
    /// Summed adjusted figures.
    pub totals: RouteTotals,
    /// Weighted objective of the totals.
    pub objective: f64,
}

/// Adjusts legs back to back using a weather provider and a [`TrafficAdjuster`].
#[derive(Debug, Clone)]
pub struct RouteEvaluator<W> {
    adjuster: TrafficAdjuster,
    weather: W,
    lenient: bool,
}

impl<W: WeatherProvider> RouteEvaluator<W> {
    /// Evaluator that propagates weather provider failures.
    pub const fn strict(adjuster: TrafficAdjuster, weather: W) -> Self {
        Self {
            adjuster,
            weather,
            lenient: false,
        }
    }

    /// Evaluator that assumes clear weather when the provider fails.
    pub const fn lenient(adjuster: TrafficAdjuster, weather: W) -> Self {
        Self {
            adjuster,
            weather,
            lenient: true,
        }
    }

    /// Underlying adjuster.
    pub const fn adjuster(&self) -> &TrafficAdjuster {
        &self.adjuster
    }

    /// Underlying weather provider.
    pub const fn weather_provider(&self) -> &W {
        &self.weather
    }

    /// Weather at the origin of `leg` at `departure`.
    pub fn weather_for(
        &self,
        leg: &Leg,
        departure: DateTime<Utc>,
    ) -> Result<WeatherCondition, ProviderError> {
        match self.weather.condition(leg.origin.location, departure) {
            Ok(condition) => Ok(condition),
            Err(err) if self.lenient => {
                warn!(
                    "weather unavailable at {} ({err}); assuming clear",
                    leg.origin.id
                );
                Ok(WeatherCondition::Clear)
            }
            Err(err) => Err(err),
        }
    }

    /// Adjust one leg departing at `departure`.
    pub fn evaluate_leg(
        &self,
        leg: &Leg,
        departure: DateTime<Utc>,
    ) -> Result<EvaluatedLeg, ProviderError> {
        let weather = self.weather_for(leg, departure)?;
        Ok(EvaluatedLeg {
            adjusted: self.adjuster.adjust(leg, departure, weather),
            departure,
            weather,
        })
    }

    /// Adjust `legs` back to back, the first departing at `departure`.
    pub fn evaluate<'a>(
        &self,
        legs: impl IntoIterator<Item = &'a Leg>,
        departure: DateTime<Utc>,
        weights: &ObjectiveWeights,
    ) -> Result<RouteEvaluation, ProviderError> {
        self.evaluate_paced(legs, departure, &Pacing::default(), weights)
    }

    /// Adjust `legs` in order, the first departing at `departure` and each
    /// later one when `pacing` lets it leave.
    pub fn evaluate_paced<'a>(
        &self,
        legs: impl IntoIterator<Item = &'a Leg>,
        departure: DateTime<Utc>,
        pacing: &Pacing,
        weights: &ObjectiveWeights,
    ) -> Result<RouteEvaluation, ProviderError> {
        let mut progress = pacing.start(departure);
        let mut evaluated = Vec::new();
        let mut totals = RouteTotals::default();
        for leg in legs {
            let result = self.evaluate_leg(leg, progress.departure)?;
            totals.add(&result.adjusted);
            progress = pacing.after(progress, &result);
            evaluated.push(result);
        }
        Ok(RouteEvaluation {
            legs: evaluated,
            objective: totals.objective(weights),
            totals,
        })
    }
}
