//! `RouteMonitor`: supervised background re-evaluation of planned routes.
//!
//! Each started session owns one Tokio task ticking on its own interval.
//! Evaluation and proposal work runs on the blocking pool; cancellation is
//! checked at tick boundaries, while waiting on blocking work, and before
//! an alert is published.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use wayfarer_core::{AlertSink, Clock, ObjectiveWeights, ProviderError, Route, RouteId, RoutePlanner};

use crate::{MonitorConfig, MonitorError, MonitorSession, SessionState};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared<P, S> {
    planner: P,
    sink: S,
    clock: Arc<dyn Clock>,
    config: MonitorConfig,
}

struct Task {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Slot {
    session: Arc<Mutex<MonitorSession>>,
    state: Arc<watch::Sender<SessionState>>,
    task: Option<Task>,
}

/// Keeps planned routes under observation and raises alerts when live
/// conditions drift from the plan.
///
/// Sessions are keyed by [`RouteId`]; at most one exists per id. The
/// monitor evaluates routes through a [`RoutePlanner`] (normally the
/// optimizer, sharing its traffic cache) and hands alerts to an
/// [`AlertSink`].
pub struct RouteMonitor<P, S> {
    shared: Arc<Shared<P, S>>,
    sessions: Mutex<HashMap<RouteId, Slot>>,
}

impl<P, S> RouteMonitor<P, S>
where
    P: RoutePlanner + 'static,
    S: AlertSink + 'static,
{
    /// Monitor with the default configuration.
    pub fn new(planner: P, sink: S, clock: Arc<dyn Clock>) -> Self {
        Self::build(planner, sink, clock, MonitorConfig::default())
    }

    /// Monitor with explicit configuration.
    ///
    /// # Errors
    /// Returns [`MonitorError::InvalidConfig`] when `config` fails
    /// [`MonitorConfig::validate`].
    pub fn with_config(
        planner: P,
        sink: S,
        clock: Arc<dyn Clock>,
        config: MonitorConfig,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self::build(planner, sink, clock, config))
    }

    fn build(planner: P, sink: S, clock: Arc<dyn Clock>, config: MonitorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                planner,
                sink,
                clock,
                config,
            }),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Create an idle session for `route`, baselined on its planned figures.
    ///
    /// The returned receiver observes every state change of the session.
    ///
    /// # Errors
    /// Returns [`MonitorError::AlreadyRegistered`] when a session exists for
    /// `route_id`.
    pub fn register(
        &self,
        route_id: RouteId,
        route: Route,
        weights: ObjectiveWeights,
    ) -> Result<watch::Receiver<SessionState>, MonitorError> {
        let mut sessions = lock(&self.sessions);
        match sessions.entry(route_id) {
            Entry::Occupied(occupied) => {
                Err(MonitorError::AlreadyRegistered(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => {
                let session =
                    MonitorSession::new(vacant.key().clone(), route, weights, &self.shared.config);
                let (state, receiver) = watch::channel(SessionState::Idle);
                debug!("registered route {}", vacant.key());
                vacant.insert(Slot {
                    session: Arc::new(Mutex::new(session)),
                    state: Arc::new(state),
                    task: None,
                });
                Ok(receiver)
            }
        }
    }

    /// Move an idle session to `Active` and spawn its ticking task. The
    /// first tick fires one interval from now.
    ///
    /// # Errors
    /// Returns [`MonitorError::UnknownRoute`], [`MonitorError::NoRuntime`]
    /// outside a Tokio runtime, or [`MonitorError::InvalidTransition`] when
    /// the session is not idle.
    pub fn start(&self, route_id: &RouteId) -> Result<(), MonitorError> {
        let runtime =
            Handle::try_current().map_err(|_| MonitorError::NoRuntime(route_id.clone()))?;
        let mut sessions = lock(&self.sessions);
        let slot = sessions
            .get_mut(route_id)
            .ok_or_else(|| MonitorError::UnknownRoute(route_id.clone()))?;
        lock(&slot.session).start()?;
        slot.state.send_replace(SessionState::Active);

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(run(
            Arc::clone(&self.shared),
            Arc::clone(&slot.session),
            Arc::clone(&slot.state),
            cancel.clone(),
        ));
        slot.task = Some(Task { cancel, handle });
        info!(
            "monitoring route {route_id} every {:?}",
            self.shared.config.tick_interval
        );
        Ok(())
    }

    /// Stop a session from any state. Idempotent.
    ///
    /// The session's task is cancelled and joined before this returns, so no
    /// tick or alert for the route happens afterwards.
    ///
    /// # Errors
    /// Returns [`MonitorError::UnknownRoute`] when no session exists.
    pub async fn stop(&self, route_id: &RouteId) -> Result<(), MonitorError> {
        let (session, state, task) = {
            let mut sessions = lock(&self.sessions);
            let slot = sessions
                .get_mut(route_id)
                .ok_or_else(|| MonitorError::UnknownRoute(route_id.clone()))?;
            (
                Arc::clone(&slot.session),
                Arc::clone(&slot.state),
                slot.task.take(),
            )
        };
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(err) = task.handle.await {
                warn!("session task for route {route_id} ended abnormally: {err}");
            }
            info!("stopped monitoring route {route_id}");
        }
        lock(&session).stop();
        state.send_replace(SessionState::Stopped);
        Ok(())
    }

    /// Stop every session.
    pub async fn shutdown(&self) {
        let ids: Vec<RouteId> = lock(&self.sessions).keys().cloned().collect();
        for route_id in ids {
            // Sessions deregistered concurrently are already gone.
            if self.stop(&route_id).await.is_err() {
                debug!("route {route_id} vanished during shutdown");
            }
        }
    }

    /// Remove a session that is not running.
    ///
    /// # Errors
    /// Returns [`MonitorError::UnknownRoute`], or
    /// [`MonitorError::InvalidTransition`] for an active or alerting session.
    pub fn deregister(&self, route_id: &RouteId) -> Result<(), MonitorError> {
        let mut sessions = lock(&self.sessions);
        let slot = sessions
            .get(route_id)
            .ok_or_else(|| MonitorError::UnknownRoute(route_id.clone()))?;
        let state = lock(&slot.session).state();
        if state.is_running() {
            return Err(MonitorError::InvalidTransition {
                route_id: route_id.clone(),
                action: "deregister",
                state,
            });
        }
        sessions.remove(route_id);
        debug!("deregistered route {route_id}");
        Ok(())
    }

    /// Current state of a session.
    #[must_use]
    pub fn state(&self, route_id: &RouteId) -> Option<SessionState> {
        lock(&self.sessions)
            .get(route_id)
            .map(|slot| lock(&slot.session).state())
    }

    /// Copy of a session's bookkeeping.
    #[must_use]
    pub fn session(&self, route_id: &RouteId) -> Option<MonitorSession> {
        lock(&self.sessions)
            .get(route_id)
            .map(|slot| lock(&slot.session).clone())
    }

    /// Observe a session's state changes.
    #[must_use]
    pub fn subscribe(&self, route_id: &RouteId) -> Option<watch::Receiver<SessionState>> {
        lock(&self.sessions)
            .get(route_id)
            .map(|slot| slot.state.subscribe())
    }

    /// Every session with its state, ordered by route id.
    #[must_use]
    pub fn sessions(&self) -> Vec<(RouteId, SessionState)> {
        let mut all: Vec<(RouteId, SessionState)> = lock(&self.sessions)
            .iter()
            .map(|(route_id, slot)| (route_id.clone(), lock(&slot.session).state()))
            .collect();
        all.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));
        all
    }
}

impl<P, S> Drop for RouteMonitor<P, S> {
    fn drop(&mut self) {
        let sessions = self
            .sessions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for slot in sessions.values() {
            if let Some(task) = &slot.task {
                task.cancel.cancel();
            }
        }
    }
}

async fn run<P, S>(
    shared: Arc<Shared<P, S>>,
    session: Arc<Mutex<MonitorSession>>,
    state: Arc<watch::Sender<SessionState>>,
    cancel: CancellationToken,
) where
    P: RoutePlanner + 'static,
    S: AlertSink + 'static,
{
    let period = shared.config.tick_interval;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tick(&shared, &session, &state, &cancel).await;
    }
    debug!("session task for route {} exited", lock(&session).route_id());
}

async fn tick<P, S>(
    shared: &Arc<Shared<P, S>>,
    session: &Mutex<MonitorSession>,
    state: &watch::Sender<SessionState>,
    cancel: &CancellationToken,
) where
    P: RoutePlanner + 'static,
    S: AlertSink + 'static,
{
    let (route_id, route, weights) = {
        let session = lock(session);
        (
            session.route_id().clone(),
            Arc::clone(session.route()),
            *session.weights(),
        )
    };
    let now = shared.clock.now();

    let evaluated = {
        let shared = Arc::clone(shared);
        let route = Arc::clone(&route);
        blocking(cancel, move || {
            shared.planner.evaluate(&route, now, &weights)
        })
        .await
    };
    let Some(evaluated) = evaluated else {
        return;
    };

    let pending = {
        let mut session = lock(session);
        let pending = match &evaluated {
            Ok(evaluation) => session.record_evaluation(now, evaluation),
            Err(err) => session.record_failure(now, err),
        };
        state.send_replace(session.state());
        pending
    };
    let Some(pending) = pending else {
        return;
    };

    let proposals = if pending.wants_proposals() {
        let shared_for_work = Arc::clone(shared);
        let flagged = pending.leg_indices.clone();
        let limit = shared.config.proposal_limit;
        let proposed = blocking(cancel, move || {
            shared_for_work
                .planner
                .propose_alternatives(&route, &flagged, now, &weights, limit)
        })
        .await;
        match proposed {
            None => return,
            Some(Ok(proposals)) => proposals,
            Some(Err(err)) => {
                warn!("route {route_id}: proposals unavailable: {err}");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    if cancel.is_cancelled() {
        return;
    }
    let alert = pending.into_alert(route_id, now, proposals);
    info!(
        "route {}: {:?} {:?} alert on legs {:?}: {}",
        alert.route_id, alert.severity, alert.kind, alert.leg_indices, alert.message
    );
    shared.sink.publish(alert);
}

/// Run `work` on the blocking pool, giving up as soon as `cancel` fires.
async fn blocking<T, F>(cancel: &CancellationToken, work: F) -> Option<Result<T, ProviderError>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
{
    let handle = task::spawn_blocking(work);
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        joined = handle => Some(joined.unwrap_or_else(|err| {
            Err(ProviderError::unavailable(format!("evaluation task failed: {err}")))
        })),
    }
}
