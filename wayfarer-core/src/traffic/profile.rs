//! Tunable magnitudes for traffic and weather multipliers.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::WeatherCondition;

/// A weekday rush-hour window in local minutes after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    /// First minute of the window.
    pub start_minute: u32,
    /// Minute the window closes (exclusive).
    pub end_minute: u32,
}

impl PeakWindow {
    /// Window from `start_minute` up to `end_minute`.
    pub const fn new(start_minute: u32, end_minute: u32) -> Self {
        Self {
            start_minute,
            end_minute,
        }
    }

    /// Closeness of `minute` to the window centre: 1.0 at the centre, 0.0 at
    /// the edges, `None` outside the window.
    fn proximity(&self, minute: f64) -> Option<f64> {
        let start = f64::from(self.start_minute);
        let end = f64::from(self.end_minute);
        if !(start..end).contains(&minute) {
            return None;
        }
        let half = (end - start) / 2.0;
        let centre = start + half;
        Some((1.0 - (minute - centre).abs() / half).clamp(0.0, 1.0))
    }
}

/// Duration multipliers per weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherFactors {
    /// Multiplier when clear.
    pub clear: f64,
    /// Multiplier in rain.
    pub rain: f64,
    /// Multiplier in snow.
    pub snow: f64,
    /// Multiplier in a storm.
    pub storm: f64,
}

impl Default for WeatherFactors {
    fn default() -> Self {
        Self {
            clear: 1.0,
            rain: 1.15,
            snow: 1.4,
            storm: 1.6,
        }
    }
}

impl WeatherFactors {
    /// Multiplier for `condition`.
    pub const fn factor(&self, condition: WeatherCondition) -> f64 {
        match condition {
            WeatherCondition::Clear => self.clear,
            WeatherCondition::Rain => self.rain,
            WeatherCondition::Snow => self.snow,
            WeatherCondition::Storm => self.storm,
        }
    }
}

/// Multiplier magnitudes applied to road-bound legs.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use wayfarer_core::TrafficProfile;
///
/// let profile = TrafficProfile::default();
/// // Wednesday 08:00 UTC sits at the centre of the morning peak.
/// let rush = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).single().expect("valid");
/// assert!((profile.peak_factor(rush) - 1.8).abs() < 1e-9);
/// // Saturday is never peak.
/// let weekend = Utc.with_ymd_and_hms(2024, 5, 4, 8, 0, 0).single().expect("valid");
/// assert_eq!(profile.peak_factor(weekend), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficProfile {
    /// Weekday rush-hour windows in local time.
    pub peak_windows: Vec<PeakWindow>,
    /// Multiplier at the edge of a window.
    pub edge_factor: f64,
    /// Multiplier at the centre of a window.
    pub peak_factor: f64,
    /// Weather multipliers.
    pub weather: WeatherFactors,
    /// Offset of local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            peak_windows: vec![PeakWindow::new(7 * 60, 9 * 60), PeakWindow::new(16 * 60, 19 * 60)],
            edge_factor: 1.3,
            peak_factor: 1.8,
            weather: WeatherFactors::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl TrafficProfile {
    /// Interpret peak windows in a local time `minutes` east of UTC.
    #[must_use]
    pub const fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Replace the weather multipliers.
    #[must_use]
    pub const fn with_weather(mut self, weather: WeatherFactors) -> Self {
        self.weather = weather;
        self
    }

    /// Replace the peak windows.
    #[must_use]
    pub fn with_peak_windows(mut self, windows: Vec<PeakWindow>) -> Self {
        self.peak_windows = windows;
        self
    }

    fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Rush-hour multiplier for a departure at `at`.
    pub fn peak_factor(&self, at: DateTime<Utc>) -> f64 {
        let local = at.with_timezone(&self.offset());
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return 1.0;
        }
        let minute = f64::from(local.hour() * 60 + local.minute()) + f64::from(local.second()) / 60.0;
        self.peak_windows
            .iter()
            .filter_map(|window| window.proximity(minute))
            .map(|p| self.edge_factor + (self.peak_factor - self.edge_factor) * p)
            .fold(None, |best: Option<f64>, f| Some(best.map_or(f, |b| b.max(f))))
            .unwrap_or(1.0)
    }

    /// Combined duration multiplier for a road-bound departure.
    pub fn road_multiplier(&self, at: DateTime<Utc>, weather: WeatherCondition) -> f64 {
        self.peak_factor(at) * self.weather.factor(weather)
    }
}
