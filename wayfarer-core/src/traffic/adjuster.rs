use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;

use crate::{AdjustedLeg, Leg, WeatherCondition};

use super::{TrafficConditionCache, TrafficKey, TrafficProfile, TrafficSnapshot};

/// Applies time-of-day and weather multipliers to base legs.
///
/// Road-bound legs consult the shared cache first; a snapshot computed for a
/// different weather condition is ignored and overwritten. Rail and air legs
/// are returned unadjusted and never touch the cache.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use geo::Coord;
/// use wayfarer_core::{
///     Leg, TrafficAdjuster, TrafficConditionCache, TrafficProfile, TransportMode, Waypoint,
///     WeatherCondition,
/// };
///
/// # fn main() -> Result<(), wayfarer_core::WaypointError> {
/// let a = Waypoint::new("a", "A", Coord { x: 0.0, y: 0.0 })?;
/// let b = Waypoint::new("b", "B", Coord { x: 1.0, y: 0.0 })?;
/// let leg = Leg::new(a, b, TransportMode::Flight, 90.0, Duration::from_secs(3600), 50.0);
/// let adjuster = TrafficAdjuster::new(Arc::new(TrafficConditionCache::new()), TrafficProfile::default());
/// let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).single().expect("valid");
/// let adjusted = adjuster.adjust(&leg, at, WeatherCondition::Storm);
/// assert_eq!(adjusted.duration_multiplier, 1.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TrafficAdjuster {
    cache: Arc<TrafficConditionCache>,
    profile: TrafficProfile,
}

impl TrafficAdjuster {
    /// Adjuster sharing `cache` and using `profile` magnitudes.
    pub const fn new(cache: Arc<TrafficConditionCache>, profile: TrafficProfile) -> Self {
        Self { cache, profile }
    }

    /// Shared snapshot cache.
    pub const fn cache(&self) -> &Arc<TrafficConditionCache> {
        &self.cache
    }

    /// Active multiplier magnitudes.
    pub const fn profile(&self) -> &TrafficProfile {
        &self.profile
    }

    /// Expected figures for `leg` departing at `departure` in `weather`.
    pub fn adjust(
        &self,
        leg: &Leg,
        departure: DateTime<Utc>,
        weather: WeatherCondition,
    ) -> AdjustedLeg {
        if !leg.mode.is_road_bound() {
            return AdjustedLeg::unadjusted(leg);
        }
        let snapshot = self.snapshot(leg, departure, weather);
        AdjustedLeg::scaled(leg, snapshot.delay_multiplier, snapshot.cost_multiplier)
    }

    fn snapshot(
        &self,
        leg: &Leg,
        departure: DateTime<Utc>,
        weather: WeatherCondition,
    ) -> TrafficSnapshot {
        let key = TrafficKey::for_leg(leg, departure);
        if let Some(hit) = self.cache.get(&key) {
            if hit.weather == weather {
                return hit;
            }
            debug!(
                "traffic snapshot {key:?} computed for {}, recomputing for {weather}",
                hit.weather
            );
        }
        let delay = self.profile.road_multiplier(departure, weather);
        let cost = if leg.mode.has_flat_rate_cost() {
            1.0
        } else {
            delay
        };
        let snapshot = TrafficSnapshot::new(key, delay, cost, weather);
        self.cache.put_default(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::waypoint;
    use crate::{Clock, ManualClock, TransportMode};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use std::time::Duration;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn leg(mode: TransportMode) -> Leg {
        Leg::new(
            waypoint("a", 0.0, 0.0),
            waypoint("b", 0.1, 0.0),
            mode,
            20.0,
            Duration::from_secs(30 * 60),
            4.0,
        )
    }

    #[fixture]
    fn adjuster() -> TrafficAdjuster {
        let cache = TrafficConditionCache::with_clock(Arc::new(ManualClock::new(at(12))));
        TrafficAdjuster::new(Arc::new(cache), TrafficProfile::default())
    }

    #[rstest]
    #[case(TransportMode::Flight)]
    #[case(TransportMode::Train)]
    fn non_road_modes_are_unadjusted(adjuster: TrafficAdjuster, #[case] mode: TransportMode) {
        let adjusted = adjuster.adjust(&leg(mode), at(8), WeatherCondition::Storm);
        assert_eq!(adjusted, AdjustedLeg::unadjusted(&leg(mode)));
        assert!(adjuster.cache().is_empty());
    }

    #[rstest]
    fn road_leg_scales_cost_and_carbon(adjuster: TrafficAdjuster) {
        let adjusted = adjuster.adjust(&leg(TransportMode::Taxi), at(8), WeatherCondition::Clear);
        assert!((adjusted.duration_multiplier - 1.8).abs() < 1e-9);
        assert!((adjusted.cost - 36.0).abs() < 1e-9);
        assert!((adjusted.carbon - 7.2).abs() < 1e-9);
        assert_eq!(adjuster.cache().len(), 1);
    }

    #[rstest]
    fn weather_mismatch_recomputes(adjuster: TrafficAdjuster) {
        let bus = leg(TransportMode::Bus);
        let clear = adjuster.adjust(&bus, at(12), WeatherCondition::Clear);
        let snow = adjuster.adjust(&bus, at(12), WeatherCondition::Snow);
        assert!((clear.duration_multiplier - 1.0).abs() < 1e-9);
        assert!((snow.duration_multiplier - 1.4).abs() < 1e-9);
        assert_eq!(adjuster.cache().len(), 1);
    }

    #[rstest]
    fn a_day_of_ticks_keeps_the_cache_small() {
        let clock = Arc::new(ManualClock::new(at(0)));
        let cache = Arc::new(TrafficConditionCache::with_clock(clock.clone()));
        let adjuster = TrafficAdjuster::new(Arc::clone(&cache), TrafficProfile::default());
        let taxi = leg(TransportMode::Taxi);
        for _ in 0..288 {
            let adjusted = adjuster.adjust(&taxi, clock.now(), WeatherCondition::Clear);
            assert!(adjusted.duration_multiplier >= 1.0);
            clock.advance(Duration::from_secs(5 * 60));
        }
        assert!(cache.len() <= 3, "{} snapshots retained", cache.len());
    }

    #[rstest]
    fn cached_snapshot_is_reused(adjuster: TrafficAdjuster) {
        let bus = leg(TransportMode::Bus);
        let key = TrafficKey::for_leg(&bus, at(8));
        adjuster.cache().put_default(TrafficSnapshot::new(
            key,
            2.0,
            2.0,
            WeatherCondition::Clear,
        ));
        let adjusted = adjuster.adjust(&bus, at(8), WeatherCondition::Clear);
        assert!((adjusted.duration_multiplier - 2.0).abs() < 1e-9);
    }
}
