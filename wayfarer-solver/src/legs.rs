//! Resolution of candidate legs for every pair the search may visit.
//!
//! Each pair gets one candidate per usable mode. Live provider answers are
//! preferred; after any failure, `NotFound` included, a remembered leg is
//! reused (stale). Without one a `NotFound` excludes the mode, and when the
//! provider only timed out a distance estimate stands in (partial).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::{debug, warn};
use wayfarer_core::{
    EstimateProfile, Leg, LegCostModel, LegEstimate, OptimizeError, ProviderError, TransportMode,
    TravelDataProvider, Waypoint, WaypointId,
};

/// Key of the optimizer's base-leg memo.
pub(crate) type MemoKey = (WaypointId, WaypointId, TransportMode);

/// Remembered successful base legs, shared across optimize calls.
pub(crate) type LegMemo = RwLock<HashMap<MemoKey, Leg>>;

/// One way of travelling a pair.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) leg: Leg,
    pub(crate) estimate: LegEstimate,
}

/// Candidates per ordered pair of waypoint indices.
#[derive(Debug, Default)]
pub(crate) struct PairTable {
    cells: HashMap<(usize, usize), Vec<Candidate>>,
}

impl PairTable {
    /// Candidates for `from → to`, in mode order. Empty when the pair was
    /// not resolved.
    pub(crate) fn candidates(&self, from: usize, to: usize) -> &[Candidate] {
        self.cells.get(&(from, to)).map_or(&[], Vec::as_slice)
    }

    fn insert(&mut self, from: usize, to: usize, candidates: Vec<Candidate>) {
        self.cells.insert((from, to), candidates);
    }
}

/// Fetches and classifies base legs.
pub(crate) struct LegResolver<'a, P> {
    pub(crate) model: &'a LegCostModel<P>,
    pub(crate) memo: &'a LegMemo,
    pub(crate) estimates: &'a EstimateProfile,
}

impl<P: TravelDataProvider> LegResolver<'_, P> {
    /// Resolve every pair `(i, j)` for which `needed(i, j)` holds.
    pub(crate) fn resolve_all(
        &self,
        stops: &[Waypoint],
        modes: &[TransportMode],
        needed: impl Fn(usize, usize) -> bool,
    ) -> Result<PairTable, OptimizeError> {
        let mut table = PairTable::default();
        for (i, from) in stops.iter().enumerate() {
            for (j, to) in stops.iter().enumerate() {
                if i == j || !needed(i, j) {
                    continue;
                }
                let candidates = self.resolve(from, to, modes).map_err(|source| {
                    OptimizeError::OptimizationFailed {
                        origin: from.id.clone(),
                        destination: to.id.clone(),
                        source,
                    }
                })?;
                table.insert(i, j, candidates);
            }
        }
        Ok(table)
    }

    /// Candidates for one pair, or the error that left it with none.
    pub(crate) fn resolve(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        modes: &[TransportMode],
    ) -> Result<Vec<Candidate>, ProviderError> {
        let mut candidates = Vec::new();
        let mut timed_out = Vec::new();
        let mut last_error = None;

        for &mode in modes {
            match self.model.base_leg(from, to, mode) {
                Ok(leg) => {
                    self.remember(&leg);
                    candidates.push(Candidate {
                        leg,
                        estimate: LegEstimate::Live,
                    });
                }
                Err(err) => {
                    if let Some(leg) = self.recall(from, to, mode) {
                        warn!(
                            "{mode} leg {} -> {}: {err}; reusing remembered figures",
                            from.id, to.id
                        );
                        candidates.push(Candidate {
                            leg,
                            estimate: LegEstimate::Stale,
                        });
                        last_error = Some(err);
                    } else if matches!(err, ProviderError::NotFound { .. }) {
                        debug!("excluding {mode} for {} -> {}: {err}", from.id, to.id);
                        last_error.get_or_insert(err);
                    } else {
                        if err.is_transient() {
                            timed_out.push(mode);
                        }
                        last_error = Some(err);
                    }
                }
            }
        }

        if candidates.is_empty() && !timed_out.is_empty() {
            warn!(
                "no live or remembered leg {} -> {}; estimating {} mode(s) from distance",
                from.id,
                to.id,
                timed_out.len()
            );
            candidates = timed_out
                .into_iter()
                .map(|mode| Candidate {
                    leg: self.estimates.estimate_leg(from, to, mode),
                    estimate: LegEstimate::Default,
                })
                .collect();
        }

        if candidates.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                ProviderError::unavailable(format!("no modes to query for {} -> {}", from.id, to.id))
            }));
        }
        Ok(candidates)
    }

    fn remember(&self, leg: &Leg) {
        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (leg.origin.id.clone(), leg.destination.id.clone(), leg.mode),
                leg.clone(),
            );
    }

    fn recall(&self, from: &Waypoint, to: &Waypoint, mode: TransportMode) -> Option<Leg> {
        self.memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(from.id.clone(), to.id.clone(), mode))
            .map(|leg| Leg {
                origin: from.clone(),
                destination: to.clone(),
                ..leg.clone()
            })
    }
}
