//! Weighted objective used to compare legs and routes.
//!
//! A leg scores `cost·w_cost + minutes·w_duration + carbon_kg·w_carbon`; a
//! route scores the sum over its legs. Lower is better.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leg::minutes;

/// Relative importance of cost, duration and carbon.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use wayfarer_core::ObjectiveWeights;
///
/// let weights = ObjectiveWeights::cost_only();
/// assert_eq!(weights.score(12.5, Duration::from_secs(600), 3.0), 12.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// Weight per unit of currency.
    pub cost: f64,
    /// Weight per minute of travel.
    pub duration: f64,
    /// Weight per kilogram of CO₂-equivalent.
    pub carbon: f64,
}

impl Default for ObjectiveWeights {
    /// Balanced weights: one hour is worth ten units of currency and one
    /// kilogram of carbon is worth a hundred.
    fn default() -> Self {
        Self {
            cost: 1.0,
            duration: 10.0 / 60.0,
            carbon: 100.0,
        }
    }
}

/// Errors from [`ObjectiveWeights::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WeightsError {
    /// A weight was NaN or infinite.
    #[error("objective weights must be finite")]
    NonFinite,
    /// A weight was below zero.
    #[error("objective weights must not be negative")]
    Negative,
    /// Every weight was zero, so all routes would tie.
    #[error("at least one objective weight must be positive")]
    AllZero,
}

impl ObjectiveWeights {
    /// Construct and validate weights.
    pub fn new(cost: f64, duration: f64, carbon: f64) -> Result<Self, WeightsError> {
        let weights = Self {
            cost,
            duration,
            carbon,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Only cost matters.
    pub const fn cost_only() -> Self {
        Self {
            cost: 1.0,
            duration: 0.0,
            carbon: 0.0,
        }
    }

    /// Only travel time matters.
    pub const fn duration_only() -> Self {
        Self {
            cost: 0.0,
            duration: 1.0,
            carbon: 0.0,
        }
    }

    /// Only emissions matter.
    pub const fn carbon_only() -> Self {
        Self {
            cost: 0.0,
            duration: 0.0,
            carbon: 1.0,
        }
    }

    /// Check the weights are finite, non-negative and not all zero.
    pub fn validate(&self) -> Result<(), WeightsError> {
        let all = [self.cost, self.duration, self.carbon];
        if all.iter().any(|w| !w.is_finite()) {
            return Err(WeightsError::NonFinite);
        }
        if all.iter().any(|w| *w < 0.0) {
            return Err(WeightsError::Negative);
        }
        if all.iter().all(|w| *w == 0.0) {
            return Err(WeightsError::AllZero);
        }
        Ok(())
    }

    /// Weighted score of a leg or a sum of legs.
    pub fn score(&self, cost: f64, duration: Duration, carbon: f64) -> f64 {
        self.cost * cost + self.duration * minutes(duration) + self.carbon * carbon
    }
}

/// Named weight presets accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    /// Cheapest route.
    Cost,
    /// Fastest route.
    Time,
    /// Lowest-emission route.
    Carbon,
    /// Trade all three off with [`ObjectiveWeights::default`].
    #[default]
    Balanced,
}

impl From<OptimizationGoal> for ObjectiveWeights {
    fn from(goal: OptimizationGoal) -> Self {
        match goal {
            OptimizationGoal::Cost => Self::cost_only(),
            OptimizationGoal::Time => Self::duration_only(),
            OptimizationGoal::Carbon => Self::carbon_only(),
            OptimizationGoal::Balanced => Self::default(),
        }
    }
}

impl std::str::FromStr for OptimizationGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cost" => Ok(Self::Cost),
            "time" | "duration" => Ok(Self::Time),
            "carbon" => Ok(Self::Carbon),
            "balanced" => Ok(Self::Balanced),
            _ => Err(format!("unknown optimisation goal '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(f64::NAN, 0.0, 0.0, WeightsError::NonFinite)]
    #[case(1.0, f64::INFINITY, 0.0, WeightsError::NonFinite)]
    #[case(-1.0, 1.0, 0.0, WeightsError::Negative)]
    #[case(0.0, 0.0, 0.0, WeightsError::AllZero)]
    fn rejects_invalid_weights(
        #[case] cost: f64,
        #[case] duration: f64,
        #[case] carbon: f64,
        #[case] expected: WeightsError,
    ) {
        assert_eq!(ObjectiveWeights::new(cost, duration, carbon), Err(expected));
    }

    #[rstest]
    fn balanced_score_matches_hand_calculation() {
        let weights = ObjectiveWeights::default();
        // 50 + 2h·10 + 0.5kg·100
        let score = weights.score(50.0, Duration::from_secs(2 * 3600), 0.5);
        assert!((score - 120.0).abs() < 1e-9, "got {score}");
    }

    #[rstest]
    #[case("cost", OptimizationGoal::Cost)]
    #[case("duration", OptimizationGoal::Time)]
    #[case("Balanced", OptimizationGoal::Balanced)]
    fn goals_parse(#[case] input: &str, #[case] expected: OptimizationGoal) {
        assert_eq!(input.parse::<OptimizationGoal>(), Ok(expected));
    }

    #[rstest]
    fn every_goal_yields_valid_weights() {
        for goal in [
            OptimizationGoal::Cost,
            OptimizationGoal::Time,
            OptimizationGoal::Carbon,
            OptimizationGoal::Balanced,
        ] {
            assert!(ObjectiveWeights::from(goal).validate().is_ok());
        }
    }
}
