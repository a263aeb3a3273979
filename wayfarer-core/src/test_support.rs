//! In-memory collaborators used by unit and behaviour tests across the
//! workspace.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use geo::Coord;

use crate::sync::{lock, read, write};
use crate::{
    Alert, AlertSink, Leg, ProviderError, TransportMode, TravelDataProvider, Waypoint, WaypointId,
    WeatherCondition, WeatherProvider,
};

/// Waypoint at `(x, y)` named after its id, skipping validation.
pub fn waypoint(id: &str, x: f64, y: f64) -> Waypoint {
    Waypoint {
        id: WaypointId::new(id),
        name: id.to_uppercase(),
        location: Coord { x, y },
    }
}

type PairKey = (WaypointId, WaypointId, TransportMode);

#[derive(Debug, Clone, Copy)]
struct Figures {
    cost: f64,
    duration: Duration,
    carbon: f64,
}

/// [`TravelDataProvider`] answering from a lookup table.
///
/// Pairs missing from the table yield [`ProviderError::NotFound`]. Failures
/// can be queued per call or forced for every call to simulate outages.
#[derive(Debug, Default)]
pub struct TableTravelDataProvider {
    entries: RwLock<HashMap<PairKey, Figures>>,
    queued: Mutex<VecDeque<ProviderError>>,
    outage: Mutex<Option<ProviderError>>,
    calls: AtomicUsize,
}

impl TableTravelDataProvider {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `a → b` and `b → a` with identical figures.
    #[must_use]
    pub fn with_symmetric(
        self,
        a: &Waypoint,
        b: &Waypoint,
        mode: TransportMode,
        cost: f64,
        duration: Duration,
        carbon: f64,
    ) -> Self {
        self.insert(a, b, mode, cost, duration, carbon);
        self.insert(b, a, mode, cost, duration, carbon);
        self
    }

    /// Add or replace the directed entry `from → to`.
    pub fn insert(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        mode: TransportMode,
        cost: f64,
        duration: Duration,
        carbon: f64,
    ) {
        write(&self.entries).insert(
            (from.id.clone(), to.id.clone(), mode),
            Figures {
                cost,
                duration,
                carbon,
            },
        );
    }

    /// Fail the next call with `err`. Queued failures are consumed in order.
    pub fn fail_next(&self, err: ProviderError) {
        lock(&self.queued).push_back(err);
    }

    /// Fail every call with `err` until cleared with `None`.
    pub fn set_outage(&self, err: Option<ProviderError>) {
        *lock(&self.outage) = err;
    }

    /// Number of `base_leg` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TravelDataProvider for TableTravelDataProvider {
    fn base_leg(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        mode: TransportMode,
    ) -> Result<Leg, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.queued).pop_front() {
            return Err(err);
        }
        if let Some(err) = lock(&self.outage).clone() {
            return Err(err);
        }
        let key = (origin.id.clone(), destination.id.clone(), mode);
        read(&self.entries).get(&key).map_or_else(
            || {
                Err(ProviderError::NotFound {
                    origin: origin.id.clone(),
                    destination: destination.id.clone(),
                    mode,
                })
            },
            |figures| {
                Ok(Leg::new(
                    origin.clone(),
                    destination.clone(),
                    mode,
                    figures.cost,
                    figures.duration,
                    figures.carbon,
                ))
            },
        )
    }
}

/// [`WeatherProvider`] returning one settable answer everywhere.
#[derive(Debug)]
pub struct StubWeatherProvider {
    answer: Mutex<Result<WeatherCondition, ProviderError>>,
}

impl StubWeatherProvider {
    /// Always `condition`.
    pub const fn with(condition: WeatherCondition) -> Self {
        Self {
            answer: Mutex::new(Ok(condition)),
        }
    }

    /// Always clear.
    pub const fn clear() -> Self {
        Self::with(WeatherCondition::Clear)
    }

    /// Always fails with `err`.
    pub const fn failing(err: ProviderError) -> Self {
        Self {
            answer: Mutex::new(Err(err)),
        }
    }

    /// Answer `condition` from now on.
    pub fn set(&self, condition: WeatherCondition) {
        *lock(&self.answer) = Ok(condition);
    }

    /// Fail with `err` from now on.
    pub fn fail(&self, err: ProviderError) {
        *lock(&self.answer) = Err(err);
    }
}

impl Default for StubWeatherProvider {
    fn default() -> Self {
        Self::clear()
    }
}

impl WeatherProvider for StubWeatherProvider {
    fn condition(
        &self,
        _location: Coord<f64>,
        _at: DateTime<Utc>,
    ) -> Result<WeatherCondition, ProviderError> {
        lock(&self.answer).clone()
    }
}

/// [`AlertSink`] that keeps every alert it receives.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlertSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of the alerts received so far, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        lock(&self.alerts).clone()
    }

    /// Number of alerts received.
    pub fn len(&self) -> usize {
        lock(&self.alerts).len()
    }

    /// Whether no alert was received.
    pub fn is_empty(&self) -> bool {
        lock(&self.alerts).is_empty()
    }
}

impl AlertSink for RecordingAlertSink {
    fn publish(&self, alert: Alert) {
        lock(&self.alerts).push(alert);
    }
}
