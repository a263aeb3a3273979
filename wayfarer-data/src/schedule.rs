//! Weather served from a fixed schedule of time windows.
//!
//! A schedule is a list of [`WeatherWindow`]s, each covering a half-open time
//! range and optionally a bounding box. Lookups scan the list from the end,
//! so later windows override earlier ones where they overlap. Outside every
//! window the schedule answers with its fallback condition, or reports the
//! provider as unavailable when it has none.
//!
//! Schedules are usually written by hand as JSON:
//!
//! ```json
//! {
//!   "fallback": "clear",
//!   "windows": [
//!     {
//!       "start": "2024-05-01T06:00:00Z",
//!       "end": "2024-05-01T10:00:00Z",
//!       "condition": "rain",
//!       "area": { "min": { "x": 2.2, "y": 48.8 }, "max": { "x": 2.5, "y": 48.9 } }
//!     }
//!   ]
//! }
//! ```

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use geo::{Coord, Rect};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wayfarer_core::{ProviderError, WeatherCondition, WeatherProvider};

/// One scheduled condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherWindow {
    /// First instant covered.
    pub start: DateTime<Utc>,
    /// First instant no longer covered.
    pub end: DateTime<Utc>,
    /// Condition inside the window.
    pub condition: WeatherCondition,
    /// Region the window applies to; everywhere when absent.
    #[serde(default)]
    pub area: Option<Rect<f64>>,
}

impl WeatherWindow {
    /// Window covering every location between `start` and `end`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>, condition: WeatherCondition) -> Self {
        Self {
            start,
            end,
            condition,
            area: None,
        }
    }

    /// Restrict the window to `area`.
    #[must_use]
    pub const fn within(mut self, area: Rect<f64>) -> Self {
        self.area = Some(area);
        self
    }

    /// Whether the window applies at `location` and `at`.
    #[must_use]
    pub fn covers(&self, location: Coord<f64>, at: DateTime<Utc>) -> bool {
        self.start <= at
            && at < self.end
            && self.area.is_none_or(|area| {
                let (min, max) = (area.min(), area.max());
                (min.x..=max.x).contains(&location.x) && (min.y..=max.y).contains(&location.y)
            })
    }
}

/// Serialized form of a [`ScheduledWeatherProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSchedule {
    /// Condition outside every window; `None` makes gaps an error.
    #[serde(default = "default_fallback")]
    pub fallback: Option<WeatherCondition>,
    /// Windows in priority order, lowest first.
    #[serde(default)]
    pub windows: Vec<WeatherWindow>,
}

const fn default_fallback() -> Option<WeatherCondition> {
    Some(WeatherCondition::Clear)
}

impl Default for WeatherSchedule {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            windows: Vec::new(),
        }
    }
}

/// Errors raised while building a schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The schedule file could not be read.
    #[error("failed to read weather schedule {path}")]
    Read {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The schedule file is not valid JSON for a [`WeatherSchedule`].
    #[error("failed to parse weather schedule {path}")]
    Parse {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A window ends at or before it starts.
    #[error("weather window {index} is empty: {start} is not before {end}")]
    EmptyWindow {
        /// Position of the window in the schedule.
        index: usize,
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },
}

/// [`WeatherProvider`] answering from a [`WeatherSchedule`].
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use geo::Coord;
/// use wayfarer_core::{WeatherCondition, WeatherProvider};
/// use wayfarer_data::{ScheduledWeatherProvider, WeatherSchedule, WeatherWindow};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let morning = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
/// let noon = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
/// let provider = ScheduledWeatherProvider::new(WeatherSchedule {
///     windows: vec![WeatherWindow::new(morning, noon, WeatherCondition::Rain)],
///     ..WeatherSchedule::default()
/// })?;
///
/// let here = Coord { x: 2.35, y: 48.85 };
/// assert_eq!(provider.condition(here, morning)?, WeatherCondition::Rain);
/// assert_eq!(provider.condition(here, noon)?, WeatherCondition::Clear);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledWeatherProvider {
    schedule: WeatherSchedule,
}

impl ScheduledWeatherProvider {
    /// Validate `schedule` and wrap it.
    ///
    /// # Errors
    /// [`ScheduleError::EmptyWindow`] when a window does not end after it
    /// starts.
    pub fn new(schedule: WeatherSchedule) -> Result<Self, ScheduleError> {
        if let Some((index, window)) = schedule
            .windows
            .iter()
            .enumerate()
            .find(|(_, window)| window.start >= window.end)
        {
            return Err(ScheduleError::EmptyWindow {
                index,
                start: window.start,
                end: window.end,
            });
        }
        Ok(Self { schedule })
    }

    /// Load and validate a JSON schedule from `path`.
    ///
    /// # Errors
    /// [`ScheduleError::Read`] or [`ScheduleError::Parse`] when the file
    /// cannot be loaded, and anything [`Self::new`] rejects.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ScheduleError> {
        let text = fs::read_to_string(path).map_err(|source| ScheduleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let schedule: WeatherSchedule =
            serde_json::from_str(&text).map_err(|source| ScheduleError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            "loaded {} weather window(s) from {path}",
            schedule.windows.len()
        );
        Self::new(schedule)
    }

    /// Schedule in use.
    #[must_use]
    pub const fn schedule(&self) -> &WeatherSchedule {
        &self.schedule
    }
}

impl WeatherProvider for ScheduledWeatherProvider {
    fn condition(
        &self,
        location: Coord<f64>,
        at: DateTime<Utc>,
    ) -> Result<WeatherCondition, ProviderError> {
        if let Some(window) = self
            .schedule
            .windows
            .iter()
            .rev()
            .find(|window| window.covers(location, at))
        {
            return Ok(window.condition);
        }
        debug!("no weather window covers ({}, {}) at {at}", location.x, location.y);
        self.schedule.fallback.ok_or_else(|| {
            ProviderError::unavailable(format!("no scheduled weather for {at}"))
        })
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests use expect for readable failures")]

    use std::io::Write;

    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};
    use tempfile::NamedTempFile;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    const PARIS: Coord<f64> = Coord { x: 2.35, y: 48.85 };
    const LYON: Coord<f64> = Coord { x: 4.84, y: 45.76 };

    fn paris_box() -> Rect<f64> {
        Rect::new(Coord { x: 2.2, y: 48.8 }, Coord { x: 2.5, y: 48.9 })
    }

    #[fixture]
    fn provider() -> ScheduledWeatherProvider {
        ScheduledWeatherProvider::new(WeatherSchedule {
            fallback: Some(WeatherCondition::Clear),
            windows: vec![
                WeatherWindow::new(at(6), at(18), WeatherCondition::Rain),
                WeatherWindow::new(at(9), at(11), WeatherCondition::Storm).within(paris_box()),
            ],
        })
        .expect("valid schedule")
    }

    #[rstest]
    #[case(PARIS, at(5), WeatherCondition::Clear)]
    #[case(PARIS, at(6), WeatherCondition::Rain)]
    #[case(PARIS, at(10), WeatherCondition::Storm)]
    #[case(LYON, at(10), WeatherCondition::Rain)]
    #[case(PARIS, at(11), WeatherCondition::Rain)]
    #[case(PARIS, at(18), WeatherCondition::Clear)]
    fn later_windows_override_earlier_ones(
        provider: ScheduledWeatherProvider,
        #[case] location: Coord<f64>,
        #[case] when: DateTime<Utc>,
        #[case] expected: WeatherCondition,
    ) {
        assert_eq!(
            provider.condition(location, when).expect("fallback covers gaps"),
            expected
        );
    }

    #[rstest]
    fn gaps_without_fallback_are_unavailable() {
        let provider = ScheduledWeatherProvider::new(WeatherSchedule {
            fallback: None,
            windows: vec![WeatherWindow::new(at(6), at(8), WeatherCondition::Snow)],
        })
        .expect("valid schedule");
        assert_eq!(
            provider.condition(PARIS, at(7)).expect("inside window"),
            WeatherCondition::Snow
        );
        assert!(matches!(
            provider.condition(PARIS, at(9)),
            Err(ProviderError::Unavailable { .. })
        ));
    }

    #[rstest]
    fn empty_windows_are_rejected() {
        let err = ScheduledWeatherProvider::new(WeatherSchedule {
            windows: vec![
                WeatherWindow::new(at(6), at(8), WeatherCondition::Rain),
                WeatherWindow::new(at(9), at(9), WeatherCondition::Rain),
            ],
            ..WeatherSchedule::default()
        })
        .expect_err("zero-length window");
        assert!(matches!(err, ScheduleError::EmptyWindow { index: 1, .. }));
    }

    #[rstest]
    fn loads_json_schedules() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{
                "windows": [{{
                    "start": "2024-05-01T06:00:00Z",
                    "end": "2024-05-01T10:00:00Z",
                    "condition": "snow"
                }}]
            }}"#
        )
        .expect("write schedule");
        let path = Utf8Path::from_path(file.path()).expect("utf-8 temp path");

        let provider = ScheduledWeatherProvider::from_path(path).expect("schedule loads");

        assert_eq!(provider.schedule().fallback, Some(WeatherCondition::Clear));
        assert_eq!(
            provider
                .condition(LYON, at(6) + Duration::minutes(30))
                .expect("inside window"),
            WeatherCondition::Snow
        );
    }

    #[rstest]
    fn malformed_files_report_their_path() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write garbage");
        let path = Utf8Path::from_path(file.path()).expect("utf-8 temp path");

        let err = ScheduledWeatherProvider::from_path(path).expect_err("garbage rejected");

        assert!(matches!(&err, ScheduleError::Parse { path: reported, .. } if reported.as_path() == path));
    }

    #[rstest]
    fn missing_files_are_read_errors() {
        let err = ScheduledWeatherProvider::from_path(Utf8Path::new("/nonexistent/weather.json"))
            .expect_err("missing file");
        assert!(matches!(err, ScheduleError::Read { .. }));
    }
}
