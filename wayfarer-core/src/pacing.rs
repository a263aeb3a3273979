//! How long a traveller stops between legs.
//!
//! A [`Pacing`] turns the arrival of one leg into the departure of the next:
//! a fixed layover at every stop and, when a daily travel limit is set, an
//! overnight rest once the time spent travelling since the last rest reaches
//! it. The default pacing chains legs back to back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EvaluatedLeg;
use crate::clock::advance;

const SECS_PER_MINUTE: u64 = 60;

fn minutes(count: u32) -> Duration {
    Duration::from_secs(u64::from(count).saturating_mul(SECS_PER_MINUTE))
}

const fn default_overnight_rest() -> u32 {
    Pacing::DEFAULT_OVERNIGHT_REST_MINUTES
}

/// Stops between consecutive legs.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use wayfarer_core::Pacing;
///
/// let pacing = Pacing::leisurely();
/// assert_eq!(pacing.layover(), Duration::from_secs(2 * 60 * 60));
/// assert_eq!(pacing.max_daily_travel(), Some(Duration::from_secs(12 * 60 * 60)));
/// assert_eq!(Pacing::default().layover(), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Minimum stop at every intermediate waypoint, in minutes.
    #[serde(default)]
    pub layover_minutes: u32,
    /// Travel allowed between overnight rests, in minutes; unlimited when
    /// absent.
    #[serde(default)]
    pub max_daily_travel_minutes: Option<u32>,
    /// Length of an overnight rest, in minutes.
    #[serde(default = "default_overnight_rest")]
    pub overnight_rest_minutes: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            layover_minutes: 0,
            max_daily_travel_minutes: None,
            overnight_rest_minutes: Self::DEFAULT_OVERNIGHT_REST_MINUTES,
        }
    }
}

impl Pacing {
    /// Overnight rest used when none is given.
    pub const DEFAULT_OVERNIGHT_REST_MINUTES: u32 = 10 * 60;
    /// Layover of [`Pacing::leisurely`].
    pub const LEISURE_LAYOVER_MINUTES: u32 = 2 * 60;
    /// Daily travel limit of [`Pacing::leisurely`].
    pub const LEISURE_DAILY_TRAVEL_MINUTES: u32 = 12 * 60;

    /// Two-hour layovers and at most twelve hours of travel a day.
    pub const fn leisurely() -> Self {
        Self {
            layover_minutes: Self::LEISURE_LAYOVER_MINUTES,
            max_daily_travel_minutes: Some(Self::LEISURE_DAILY_TRAVEL_MINUTES),
            overnight_rest_minutes: Self::DEFAULT_OVERNIGHT_REST_MINUTES,
        }
    }

    /// Set the layover.
    #[must_use]
    pub const fn with_layover_minutes(mut self, minutes: u32) -> Self {
        self.layover_minutes = minutes;
        self
    }

    /// Set the daily travel limit.
    #[must_use]
    pub const fn with_max_daily_travel_minutes(mut self, minutes: u32) -> Self {
        self.max_daily_travel_minutes = Some(minutes);
        self
    }

    /// Set the overnight rest.
    #[must_use]
    pub const fn with_overnight_rest_minutes(mut self, minutes: u32) -> Self {
        self.overnight_rest_minutes = minutes;
        self
    }

    /// Minimum stop between legs.
    pub fn layover(&self) -> Duration {
        minutes(self.layover_minutes)
    }

    /// Travel allowed between overnight rests.
    pub fn max_daily_travel(&self) -> Option<Duration> {
        self.max_daily_travel_minutes.map(minutes)
    }

    /// Length of an overnight rest.
    pub fn overnight_rest(&self) -> Duration {
        minutes(self.overnight_rest_minutes)
    }

    /// Reject limits no itinerary can satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_daily_travel_minutes == Some(0) {
            return Err("max daily travel must be positive".to_owned());
        }
        Ok(())
    }

    /// Progress before the first leg, departing at `departure`.
    pub const fn start(&self, departure: DateTime<Utc>) -> Progress {
        Progress {
            departure,
            travelled: Duration::ZERO,
        }
    }

    /// Progress once `leg` has been travelled from `progress`.
    ///
    /// The next leg leaves after the layover, or after an overnight rest when
    /// travel since the last rest has reached the daily limit.
    pub fn after(&self, progress: Progress, leg: &EvaluatedLeg) -> Progress {
        let arrival = leg.arrival();
        let travelled = progress.travelled.saturating_add(leg.adjusted.duration);
        match self.max_daily_travel() {
            Some(limit) if travelled >= limit => Progress {
                departure: advance(arrival, self.overnight_rest()),
                travelled: Duration::ZERO,
            },
            _ => Progress {
                departure: advance(arrival, self.layover()),
                travelled,
            },
        }
    }
}

/// Where a traveller stands between two legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Departure of the next leg.
    pub departure: DateTime<Utc>,
    /// Travel since the last overnight rest.
    pub travelled: Duration,
}
