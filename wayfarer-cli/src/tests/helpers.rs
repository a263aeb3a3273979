//! Temporary workspaces holding request and weather files.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone, Utc};
use geo::Coord;
use tempfile::TempDir;
use wayfarer_core::{Clock, ManualClock, OptimizeRequest, TransportMode, Waypoint};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).expect("write fixture file");
}

/// Wednesday, off-peak.
pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn manual_clock(hour: u32) -> Arc<dyn Clock> {
    Arc::new(ManualClock::new(at(hour)))
}

/// Three stops around Paris, a few kilometres apart, departing at 11:00.
pub(super) fn paris_request() -> OptimizeRequest {
    let stop = |id: &str, x: f64, y: f64| {
        Waypoint::new(id, id, Coord { x, y }).expect("valid waypoint")
    };
    OptimizeRequest::new(
        vec![
            stop("louvre", 2.3376, 48.8606),
            stop("versailles", 2.1204, 48.8049),
            stop("vincennes", 2.4350, 48.8428),
        ],
        at(11),
    )
    .with_fixed_start("louvre")
}

pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write_request(&self, request: &OptimizeRequest) -> Utf8PathBuf {
        let path = self.path("request.json");
        let payload = serde_json::to_string_pretty(request).expect("serialize request");
        write_utf8(&path, payload.as_bytes());
        path
    }

    /// Schedule with rain from noon to 14:00 and clear weather otherwise.
    pub(super) fn write_rain_at_noon(&self) -> Utf8PathBuf {
        let path = self.path("weather.json");
        write_utf8(
            &path,
            br#"{
                "fallback": "clear",
                "windows": [{
                    "start": "2024-05-01T12:00:00Z",
                    "end": "2024-05-01T14:00:00Z",
                    "condition": "rain"
                }]
            }"#,
        );
        path
    }
}

pub(super) fn taxi_only(request: OptimizeRequest) -> OptimizeRequest {
    request.with_modes([TransportMode::Taxi])
}
