//! Traffic and weather adjustment of base legs.
//!
//! [`TrafficProfile`] holds the multiplier magnitudes,
//! [`TrafficConditionCache`] memoises computed multipliers per 15-minute
//! departure bucket, and [`TrafficAdjuster`] combines the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Leg, TransportMode, WaypointId, WeatherCondition};

mod adjuster;
mod cache;
mod profile;

pub use adjuster::TrafficAdjuster;
pub use cache::TrafficConditionCache;
pub use profile::{PeakWindow, TrafficProfile, WeatherFactors};

/// Width of a departure bucket in seconds.
pub const BUCKET_SECONDS: i64 = 15 * 60;

/// Cache key: a directed pair, a mode and a 15-minute departure bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrafficKey {
    /// Leg origin.
    pub origin: WaypointId,
    /// Leg destination.
    pub destination: WaypointId,
    /// Leg mode.
    pub mode: TransportMode,
    /// Departure time in whole buckets since the Unix epoch.
    pub bucket: i64,
}

impl TrafficKey {
    /// Key for `leg` departing at `departure`.
    pub fn for_leg(leg: &Leg, departure: DateTime<Utc>) -> Self {
        Self {
            origin: leg.origin.id.clone(),
            destination: leg.destination.id.clone(),
            mode: leg.mode,
            bucket: bucket_of(departure),
        }
    }
}

/// Departure bucket containing `at`.
pub fn bucket_of(at: DateTime<Utc>) -> i64 {
    at.timestamp().div_euclid(BUCKET_SECONDS)
}

/// Multipliers computed for one key, valid until `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    /// What the multipliers apply to.
    pub key: TrafficKey,
    /// Factor on duration and carbon.
    pub delay_multiplier: f64,
    /// Factor on cost.
    pub cost_multiplier: f64,
    /// Weather the multipliers were computed for.
    pub weather: WeatherCondition,
    /// Last instant at which the snapshot may be used. Set by the cache on
    /// insertion.
    pub expires_at: DateTime<Utc>,
}

impl TrafficSnapshot {
    /// Snapshot awaiting insertion; the cache assigns the expiry.
    pub const fn new(
        key: TrafficKey,
        delay_multiplier: f64,
        cost_multiplier: f64,
        weather: WeatherCondition,
    ) -> Self {
        Self {
            key,
            delay_multiplier,
            cost_multiplier,
            weather,
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Whether the snapshot is still usable at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}
