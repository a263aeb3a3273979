//! The per-route monitoring state machine.
//!
//! [`MonitorSession`] is pure: it consumes tick outcomes and says which
//! alert, if any, to raise. The [`RouteMonitor`](crate::RouteMonitor) drives
//! it from a Tokio task and attaches re-routing proposals.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use wayfarer_core::{
    AdjustedLeg, Alert, AlertKind, AlertSeverity, ObjectiveWeights, ProviderError,
    RerouteProposal, Route, RouteEvaluation, RouteId, RouteTotals,
};

use crate::{MonitorConfig, MonitorError};

/// Lifecycle of a monitoring session.
///
/// `Idle → Active ⇄ Alerting`, and `Stopped` from anywhere. A session only
/// reaches `Alerting` through `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Registered but not yet ticking.
    Idle,
    /// Ticking, conditions within threshold.
    Active,
    /// Ticking, route totals beyond threshold.
    Alerting,
    /// No longer ticking; terminal.
    Stopped,
}

impl SessionState {
    /// Whether the session's task should keep ticking.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Active | Self::Alerting)
    }

    /// Return the state as a `snake_case` `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Alerting => "alerting",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth of the route's totals past the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteBreach {
    /// Whether total duration or total cost grew the most.
    pub kind: AlertKind,
    /// Relative increase of that total.
    pub delta: f64,
    /// Legs behind the increase, in route order.
    pub legs: Vec<LegBreach>,
}

/// One leg's share of a [`RouteBreach`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegBreach {
    /// Index of the leg in the route.
    pub index: usize,
    /// Relative increase of the breaching figure on this leg.
    pub delta: f64,
}

/// An alert decided by the state machine, before proposals are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlert {
    /// Legs the alert concerns; empty for data outages.
    pub leg_indices: Vec<usize>,
    /// Trigger.
    pub kind: AlertKind,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Relative increase of the route total that breached.
    pub delta: f64,
    /// Human-readable summary.
    pub message: String,
}

impl PendingAlert {
    /// Whether re-routing proposals are worth computing for this alert.
    #[must_use]
    pub fn wants_proposals(&self) -> bool {
        self.kind != AlertKind::DataUnavailable && !self.leg_indices.is_empty()
    }

    /// Finish the alert.
    #[must_use]
    pub fn into_alert(
        self,
        route_id: RouteId,
        timestamp: DateTime<Utc>,
        proposals: Vec<RerouteProposal>,
    ) -> Alert {
        Alert {
            route_id,
            leg_indices: self.leg_indices,
            kind: self.kind,
            severity: self.severity,
            message: self.message,
            delta: self.delta,
            timestamp,
            proposals,
        }
    }
}

/// Observation state for one route.
#[derive(Debug, Clone)]
pub struct MonitorSession {
    route_id: RouteId,
    route: Arc<Route>,
    weights: ObjectiveWeights,
    baseline: Vec<AdjustedLeg>,
    baseline_totals: RouteTotals,
    tick_interval: Duration,
    threshold: f64,
    escalation_ticks: u32,
    failure_threshold: u32,
    state: SessionState,
    last_check: Option<DateTime<Utc>>,
    breach_ticks: u32,
    failure_ticks: u32,
    flagged: BTreeSet<usize>,
}

impl MonitorSession {
    /// Idle session whose baseline is the route's figures as planned.
    #[must_use]
    pub fn new(
        route_id: RouteId,
        route: Route,
        weights: ObjectiveWeights,
        config: &MonitorConfig,
    ) -> Self {
        let baseline: Vec<AdjustedLeg> = route.legs().iter().map(|leg| leg.adjusted).collect();
        let baseline_totals = RouteTotals::of(&baseline);
        Self {
            route_id,
            route: Arc::new(route),
            weights,
            baseline,
            baseline_totals,
            tick_interval: config.tick_interval,
            threshold: config.alert_threshold,
            escalation_ticks: config.escalation_ticks,
            failure_threshold: config.failure_threshold,
            state: SessionState::Idle,
            last_check: None,
            breach_ticks: 0,
            failure_ticks: 0,
            flagged: BTreeSet::new(),
        }
    }

    /// Route identifier.
    #[must_use]
    pub const fn route_id(&self) -> &RouteId {
        &self.route_id
    }

    /// Route snapshot taken at registration.
    #[must_use]
    pub const fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Weights used to score proposals.
    #[must_use]
    pub const fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Time between ticks.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// When the route was last checked, successfully or not.
    #[must_use]
    pub const fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    /// Consecutive ticks with at least one breach.
    #[must_use]
    pub const fn breach_ticks(&self) -> u32 {
        self.breach_ticks
    }

    /// Consecutive ticks that failed to evaluate the route.
    #[must_use]
    pub const fn failure_ticks(&self) -> u32 {
        self.failure_ticks
    }

    /// `Idle → Active`.
    ///
    /// # Errors
    /// Returns [`MonitorError::InvalidTransition`] from any other state.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.state != SessionState::Idle {
            return Err(MonitorError::InvalidTransition {
                route_id: self.route_id.clone(),
                action: "start",
                state: self.state,
            });
        }
        self.state = SessionState::Active;
        Ok(())
    }

    /// Enter `Stopped`. Idempotent.
    pub const fn stop(&mut self) {
        self.state = SessionState::Stopped;
    }

    /// Whether the total duration or cost of `evaluation` rose beyond the
    /// threshold relative to the baseline totals.
    ///
    /// The breach names the legs whose own growth in the breaching figure
    /// exceeds the threshold, or every leg that grew at all when none does.
    #[must_use]
    pub fn breaches(&self, evaluation: &RouteEvaluation) -> Option<RouteBreach> {
        let duration = relative_increase(
            self.baseline_totals.duration.as_secs_f64(),
            evaluation.totals.duration.as_secs_f64(),
        );
        let cost = relative_increase(self.baseline_totals.cost, evaluation.totals.cost);
        let (kind, delta) = if cost > duration {
            (AlertKind::CostIncrease, cost)
        } else {
            (AlertKind::DurationIncrease, duration)
        };
        if delta <= self.threshold {
            return None;
        }

        let grown: Vec<LegBreach> = self
            .baseline
            .iter()
            .zip(&evaluation.legs)
            .enumerate()
            .map(|(index, (base, now))| LegBreach {
                index,
                delta: leg_increase(kind, base, &now.adjusted),
            })
            .filter(|leg| leg.delta > 0.0)
            .collect();
        let over: Vec<LegBreach> = grown
            .iter()
            .copied()
            .filter(|leg| leg.delta > self.threshold)
            .collect();
        Some(RouteBreach {
            kind,
            delta,
            legs: if over.is_empty() { grown } else { over },
        })
    }

    /// Apply a successful tick. Returns the alert to raise, if any.
    pub fn record_evaluation(
        &mut self,
        at: DateTime<Utc>,
        evaluation: &RouteEvaluation,
    ) -> Option<PendingAlert> {
        if !self.state.is_running() {
            return None;
        }
        self.last_check = Some(at);
        self.failure_ticks = 0;

        let Some(breach) = self.breaches(evaluation) else {
            if self.state == SessionState::Alerting {
                info!("route {} is back within threshold", self.route_id);
                self.state = SessionState::Active;
            }
            self.breach_ticks = 0;
            self.flagged.clear();
            return None;
        };

        let current: BTreeSet<usize> = breach.legs.iter().map(|leg| leg.index).collect();
        let entering = self.state == SessionState::Active;
        let newly: BTreeSet<usize> = current.difference(&self.flagged).copied().collect();
        self.state = SessionState::Alerting;
        self.breach_ticks = if entering {
            1
        } else {
            self.breach_ticks.saturating_add(1)
        };
        self.flagged = current;

        if self.breach_ticks == self.escalation_ticks {
            return Some(self.breach_alert(AlertSeverity::Major, &breach, &breach.legs));
        }
        if entering {
            return Some(self.breach_alert(AlertSeverity::Minor, &breach, &breach.legs));
        }
        if newly.is_empty() {
            return None;
        }
        let fresh: Vec<LegBreach> = breach
            .legs
            .iter()
            .copied()
            .filter(|leg| newly.contains(&leg.index))
            .collect();
        Some(self.breach_alert(AlertSeverity::Minor, &breach, &fresh))
    }

    /// Apply a failed tick: the baseline is kept and the failure counted.
    /// Returns a data-unavailable alert when the threshold is reached.
    pub fn record_failure(
        &mut self,
        at: DateTime<Utc>,
        error: &ProviderError,
    ) -> Option<PendingAlert> {
        if !self.state.is_running() {
            return None;
        }
        self.last_check = Some(at);
        self.failure_ticks = self.failure_ticks.saturating_add(1);
        warn!(
            "route {}: tick skipped after {} consecutive failure(s): {error}",
            self.route_id, self.failure_ticks
        );
        (self.failure_ticks == self.failure_threshold).then(|| PendingAlert {
            leg_indices: Vec::new(),
            kind: AlertKind::DataUnavailable,
            severity: AlertSeverity::Major,
            delta: 0.0,
            message: format!(
                "conditions could not be checked for {} consecutive ticks: {error}",
                self.failure_ticks
            ),
        })
    }

    #[expect(clippy::float_arithmetic, reason = "delta rendered as a percentage")]
    fn breach_alert(
        &self,
        severity: AlertSeverity,
        breach: &RouteBreach,
        legs: &[LegBreach],
    ) -> PendingAlert {
        let leg_indices: Vec<usize> = legs.iter().map(|leg| leg.index).collect();
        let figure = match breach.kind {
            AlertKind::CostIncrease => "cost",
            _ => "duration",
        };
        let message = match severity {
            AlertSeverity::Minor => format!(
                "total {figure} rose {:.0}% above plan, driven by leg(s) {leg_indices:?}",
                breach.delta * 100.0
            ),
            AlertSeverity::Major => format!(
                "total {figure} has stayed {:.0}% above plan for {} ticks, driven by leg(s) {leg_indices:?}",
                breach.delta * 100.0,
                self.breach_ticks
            ),
        };
        PendingAlert {
            leg_indices,
            kind: breach.kind,
            severity,
            delta: breach.delta,
            message,
        }
    }
}

fn leg_increase(kind: AlertKind, base: &AdjustedLeg, now: &AdjustedLeg) -> f64 {
    match kind {
        AlertKind::CostIncrease => relative_increase(base.cost, now.cost),
        _ => relative_increase(base.duration.as_secs_f64(), now.duration.as_secs_f64()),
    }
}

/// `(now - base) / base`, or zero when there is no positive base to compare.
#[expect(clippy::float_arithmetic, reason = "relative change of leg figures")]
const fn relative_increase(base: f64, now: f64) -> f64 {
    if base > 0.0 && now.is_finite() {
        (now - base) / base
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use wayfarer_core::test_support::waypoint;
    use wayfarer_core::{
        EvaluatedLeg, ItineraryKind, Leg, LegEstimate, RouteLeg, RouteTotals, SearchMethod,
        TransportMode, Waypoint, WeatherCondition,
    };

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn stops() -> [Waypoint; 3] {
        [
            waypoint("a", 0.0, 0.0),
            waypoint("b", 0.2, 0.0),
            waypoint("c", 0.4, 0.0),
        ]
    }

    fn legs() -> Vec<Leg> {
        let [a, b, c] = stops();
        let half_hour = Duration::from_secs(30 * 60);
        vec![
            Leg::new(a, b.clone(), TransportMode::Taxi, 30.0, half_hour, 3.0),
            Leg::new(b, c, TransportMode::Bus, 5.0, half_hour, 1.0),
        ]
    }

    fn route() -> Route {
        let route_legs = legs()
            .into_iter()
            .map(|leg| RouteLeg {
                adjusted: AdjustedLeg::unadjusted(&leg),
                leg,
                departure: noon(),
                weather: WeatherCondition::Clear,
                estimate: LegEstimate::Live,
            })
            .collect();
        Route::new(
            stops().to_vec(),
            route_legs,
            ItineraryKind::Open,
            SearchMethod::Exact,
            &ObjectiveWeights::default(),
            noon(),
        )
        .expect("valid route")
    }

    /// Evaluation with the given (duration, cost) multipliers per leg.
    fn evaluation(multipliers: &[(f64, f64)]) -> RouteEvaluation {
        let legs: Vec<EvaluatedLeg> = legs()
            .iter()
            .zip(multipliers)
            .map(|(leg, &(duration, cost))| EvaluatedLeg {
                adjusted: AdjustedLeg::scaled(leg, duration, cost),
                departure: noon(),
                weather: WeatherCondition::Clear,
            })
            .collect();
        let totals = RouteTotals::of(legs.iter().map(|leg| &leg.adjusted));
        RouteEvaluation {
            objective: totals.objective(&ObjectiveWeights::default()),
            legs,
            totals,
        }
    }

    const CALM: &[(f64, f64)] = &[(1.0, 1.0), (1.0, 1.0)];
    const FIRST_SLOW: &[(f64, f64)] = &[(1.6, 1.0), (1.0, 1.0)];
    const BOTH_SLOW: &[(f64, f64)] = &[(1.6, 1.0), (1.5, 1.0)];

    #[fixture]
    fn session() -> MonitorSession {
        MonitorSession::new(
            RouteId::new("trip"),
            route(),
            ObjectiveWeights::default(),
            &MonitorConfig::default(),
        )
    }

    #[fixture]
    fn active(mut session: MonitorSession) -> MonitorSession {
        session.start().expect("idle session starts");
        session
    }

    #[rstest]
    fn idle_sessions_ignore_ticks(mut session: MonitorSession) {
        assert!(session.record_evaluation(noon(), &evaluation(FIRST_SLOW)).is_none());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.last_check().is_none());
    }

    #[rstest]
    fn start_only_from_idle(mut active: MonitorSession) {
        let err = active.start().expect_err("already active");
        assert!(matches!(
            err,
            MonitorError::InvalidTransition {
                state: SessionState::Active,
                ..
            }
        ));
    }

    #[rstest]
    fn first_breach_raises_one_minor_alert(mut active: MonitorSession) {
        let alert = active
            .record_evaluation(noon(), &evaluation(FIRST_SLOW))
            .expect("breach alerts");
        assert_eq!(alert.severity, AlertSeverity::Minor);
        assert_eq!(alert.kind, AlertKind::DurationIncrease);
        assert_eq!(alert.leg_indices, vec![0]);
        assert!(alert.delta > 0.29 && alert.delta < 0.31);
        assert_eq!(active.state(), SessionState::Alerting);

        assert!(active.record_evaluation(noon(), &evaluation(FIRST_SLOW)).is_none());
        assert_eq!(active.breach_ticks(), 2);
    }

    #[rstest]
    fn persistent_breach_escalates_once(mut active: MonitorSession) {
        let severities: Vec<Option<AlertSeverity>> = (0..5)
            .map(|_| {
                active
                    .record_evaluation(noon(), &evaluation(FIRST_SLOW))
                    .map(|alert| alert.severity)
            })
            .collect();
        assert_eq!(
            severities,
            vec![
                Some(AlertSeverity::Minor),
                None,
                Some(AlertSeverity::Major),
                None,
                None
            ]
        );
    }

    #[rstest]
    fn newly_flagged_legs_get_their_own_alert(mut active: MonitorSession) {
        active.record_evaluation(noon(), &evaluation(FIRST_SLOW));
        let alert = active
            .record_evaluation(noon(), &evaluation(BOTH_SLOW))
            .expect("new leg alerts");
        assert_eq!(alert.severity, AlertSeverity::Minor);
        assert_eq!(alert.leg_indices, vec![1]);
    }

    #[rstest]
    fn recovery_returns_to_active(mut active: MonitorSession) {
        active.record_evaluation(noon(), &evaluation(FIRST_SLOW));
        assert!(active.record_evaluation(noon(), &evaluation(CALM)).is_none());
        assert_eq!(active.state(), SessionState::Active);
        assert_eq!(active.breach_ticks(), 0);

        let again = active.record_evaluation(noon(), &evaluation(FIRST_SLOW));
        assert_eq!(again.map(|alert| alert.severity), Some(AlertSeverity::Minor));
    }

    #[rstest]
    fn cost_increase_is_classified(mut active: MonitorSession) {
        let alert = active
            .record_evaluation(noon(), &evaluation(&[(1.0, 2.0), (1.0, 1.0)]))
            .expect("cost breach alerts");
        assert_eq!(alert.kind, AlertKind::CostIncrease);
    }

    #[rstest]
    fn small_increase_is_not_a_breach(active: MonitorSession) {
        assert!(active.breaches(&evaluation(&[(1.1, 1.0), (1.1, 1.1)])).is_none());
    }

    #[rstest]
    fn one_slow_leg_within_route_tolerance_is_not_a_breach(active: MonitorSession) {
        // Leg 0 alone is 25% slower, the whole trip only 12.5%.
        assert!(active.breaches(&evaluation(&[(1.25, 1.0), (1.0, 1.0)])).is_none());
    }

    #[rstest]
    fn breach_names_the_legs_behind_it(active: MonitorSession) {
        let breach = active
            .breaches(&evaluation(&[(1.6, 1.0), (1.1, 1.0)]))
            .expect("total duration is 35% over plan");
        assert_eq!(breach.kind, AlertKind::DurationIncrease);
        assert!(breach.delta > 0.34 && breach.delta < 0.36);
        let indices: Vec<usize> = breach.legs.iter().map(|leg| leg.index).collect();
        assert_eq!(indices, vec![0]);
    }

    #[rstest]
    fn evenly_spread_drift_flags_every_grown_leg() {
        let session = MonitorSession::new(
            RouteId::new("trip"),
            route(),
            ObjectiveWeights::default(),
            &MonitorConfig::default().with_alert_threshold(0.1),
        );
        let breach = session
            .breaches(&evaluation(&[(1.15, 1.0), (1.15, 1.0)]))
            .expect("total duration is 15% over plan");
        let indices: Vec<usize> = breach.legs.iter().map(|leg| leg.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[rstest]
    fn failures_alert_once_at_the_threshold(mut active: MonitorSession) {
        let err = ProviderError::unavailable("weather feed down");
        let raised: Vec<bool> = (0..5)
            .map(|_| active.record_failure(noon(), &err).is_some())
            .collect();
        assert_eq!(raised, vec![false, false, true, false, false]);
        assert_eq!(active.state(), SessionState::Active);

        active.record_evaluation(noon(), &evaluation(CALM));
        assert_eq!(active.failure_ticks(), 0);
    }

    #[rstest]
    fn stopped_sessions_stay_stopped(mut active: MonitorSession) {
        active.stop();
        active.stop();
        assert!(active.record_evaluation(noon(), &evaluation(FIRST_SLOW)).is_none());
        assert!(active.start().is_err());
        assert_eq!(active.state(), SessionState::Stopped);
    }

    #[rstest]
    fn pending_alert_becomes_an_alert(mut active: MonitorSession) {
        let pending = active
            .record_evaluation(noon(), &evaluation(FIRST_SLOW))
            .expect("breach alerts");
        assert!(pending.wants_proposals());
        let alert = pending.into_alert(RouteId::new("trip"), noon(), Vec::new());
        assert_eq!(alert.route_id.as_str(), "trip");
        assert_eq!(alert.timestamp, noon());
    }
}
