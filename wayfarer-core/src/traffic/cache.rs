//! Time-bounded store of traffic snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use crate::clock::advance;
use crate::sync::{lock, read, write};
use crate::{Clock, SystemClock};

use super::{TrafficKey, TrafficSnapshot};

/// Shared cache of [`TrafficSnapshot`]s keyed by [`TrafficKey`].
///
/// A single `RwLock` guards the whole map: lookups share the read lock and
/// only insertions and evictions take the write lock. Concurrent writes to
/// one key are last-write-wins. Expired entries are never returned; a lookup
/// that finds one removes it. Keys carry a departure bucket, so most expired
/// entries are never looked up again: writes sweep the whole map at most
/// once per default TTL.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use wayfarer_core::{
///     ManualClock, TrafficConditionCache, TrafficKey, TrafficSnapshot, TransportMode,
///     WeatherCondition,
/// };
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid");
/// let clock = Arc::new(ManualClock::new(start));
/// let cache = TrafficConditionCache::with_clock(clock.clone());
/// let key = TrafficKey {
///     origin: "a".into(),
///     destination: "b".into(),
///     mode: TransportMode::Bus,
///     bucket: 0,
/// };
/// cache.put(
///     TrafficSnapshot::new(key.clone(), 1.2, 1.2, WeatherCondition::Clear),
///     Duration::from_secs(60),
/// );
/// assert!(cache.get(&key).is_some());
/// clock.advance(Duration::from_secs(61));
/// assert!(cache.get(&key).is_none());
/// ```
#[derive(Debug)]
pub struct TrafficConditionCache {
    entries: RwLock<HashMap<TrafficKey, TrafficSnapshot>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    next_sweep: Mutex<Option<DateTime<Utc>>>,
}

impl Default for TrafficConditionCache {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl TrafficConditionCache {
    /// Default lifetime of an entry.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

    /// Empty cache using the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            default_ttl: Self::DEFAULT_TTL,
            next_sweep: Mutex::new(None),
        }
    }

    /// Override the lifetime used by [`TrafficConditionCache::put_default`].
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Lifetime used when the caller does not pick one.
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Time source the cache measures expiry against.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Live snapshot for `key`, if any.
    pub fn get(&self, key: &TrafficKey) -> Option<TrafficSnapshot> {
        let now = self.clock.now();
        {
            let entries = read(&self.entries);
            match entries.get(key) {
                None => return None,
                Some(snapshot) if snapshot.is_live_at(now) => return Some(snapshot.clone()),
                Some(_) => {}
            }
        }
        let mut entries = write(&self.entries);
        // A writer may have refreshed the entry between the two locks.
        if let Some(snapshot) = entries.get(key) {
            if snapshot.is_live_at(now) {
                return Some(snapshot.clone());
            }
            debug!("evicting expired traffic snapshot {key:?}");
            entries.remove(key);
        }
        None
    }

    /// Store `snapshot`, valid for `ttl` from now. Replaces any entry for
    /// the same key, and drops expired entries when a sweep is due.
    pub fn put(&self, mut snapshot: TrafficSnapshot, ttl: Duration) {
        let now = self.clock.now();
        snapshot.expires_at = advance(now, ttl);
        let mut entries = write(&self.entries);
        if self.sweep_due(now) {
            let before = entries.len();
            entries.retain(|_, existing| existing.is_live_at(now));
            let swept = before - entries.len();
            if swept > 0 {
                debug!("swept {swept} expired traffic snapshot(s)");
            }
        }
        entries.insert(snapshot.key.clone(), snapshot);
    }

    fn sweep_due(&self, now: DateTime<Utc>) -> bool {
        let mut next = lock(&self.next_sweep);
        if next.is_some_and(|at| now < at) {
            return false;
        }
        *next = Some(advance(now, self.default_ttl));
        true
    }

    /// Store `snapshot` with the default lifetime.
    pub fn put_default(&self, snapshot: TrafficSnapshot) {
        self.put(snapshot, self.default_ttl);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = write(&self.entries);
        let before = entries.len();
        entries.retain(|_, snapshot| snapshot.is_live_at(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, TransportMode, WeatherCondition};
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }

    fn key(bucket: i64) -> TrafficKey {
        TrafficKey {
            origin: "a".into(),
            destination: "b".into(),
            mode: TransportMode::Taxi,
            bucket,
        }
    }

    fn snapshot(bucket: i64, multiplier: f64) -> TrafficSnapshot {
        TrafficSnapshot::new(key(bucket), multiplier, multiplier, WeatherCondition::Clear)
    }

    #[rstest]
    fn hit_at_expiry_instant_and_miss_after(clock: Arc<ManualClock>) {
        let cache = TrafficConditionCache::with_clock(clock.clone());
        cache.put(snapshot(1, 1.5), Duration::from_secs(600));
        clock.advance(Duration::from_secs(600));
        assert!(cache.get(&key(1)).is_some());
        clock.advance(Duration::from_millis(1));
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.is_empty(), "expired entry should be discarded");
    }

    #[rstest]
    fn last_write_wins(clock: Arc<ManualClock>) {
        let cache = TrafficConditionCache::with_clock(clock);
        cache.put(snapshot(1, 1.2), Duration::from_secs(60));
        cache.put(snapshot(1, 1.7), Duration::from_secs(60));
        let hit = cache.get(&key(1)).expect("entry present");
        assert!((hit.delay_multiplier - 1.7).abs() < f64::EPSILON);
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn purge_removes_only_expired(clock: Arc<ManualClock>) {
        let cache = TrafficConditionCache::with_clock(clock.clone());
        cache.put(snapshot(1, 1.2), Duration::from_secs(60));
        cache.put(snapshot(2, 1.2), Duration::from_secs(600));
        clock.advance(Duration::from_secs(120));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.get(&key(2)).is_some());
    }

    #[rstest]
    fn writes_sweep_entries_from_past_buckets(clock: Arc<ManualClock>) {
        let cache = TrafficConditionCache::with_clock(clock.clone());
        for bucket in 0..96 {
            for _ in 0..3 {
                cache.put_default(snapshot(bucket, 1.2));
                clock.advance(Duration::from_secs(5 * 60));
            }
            assert!(cache.len() <= 3, "bucket {bucket}: {} entries", cache.len());
        }
        assert!(cache.get(&key(95)).is_some());
    }

    #[rstest]
    fn concurrent_writers_leave_one_entry(clock: Arc<ManualClock>) {
        let cache = Arc::new(TrafficConditionCache::with_clock(clock));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.put(snapshot(1, 1.0 + f64::from(i) / 10.0), Duration::from_secs(60));
                    cache.get(&key(1))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("thread completes").is_some());
        }
        assert_eq!(cache.len(), 1);
    }
}
