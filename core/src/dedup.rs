//! Duplicate filter parameters.
//!
//! Policy: reject a submission when the same reporter already has a
//! complaint within `radius_m` created inside the last `window_hours`.
//! The store runs the check and the insert inside one IMMEDIATE (write)
//! transaction, so two near-simultaneous submissions cannot both pass:
//! the write lock is held across the scan, and the losing transaction
//! waits for the winner's commit and then sees its row.

use crate::config::DedupConfig;
use crate::geo::{self, GeoPoint};
use chrono::{DateTime, Duration, Utc};

/// Precomputed query window for one candidate submission.
#[derive(Debug, Clone)]
pub struct DedupCheck {
    pub center: GeoPoint,
    pub radius_m: f64,
    pub window_hours: i64,
    /// Oldest creation time (unix seconds) still inside the window.
    pub since_unix: i64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl DedupCheck {
    pub fn for_submission(config: &DedupConfig, point: &GeoPoint, now: DateTime<Utc>) -> Self {
        let since = now - Duration::hours(config.window_hours);
        let (lat_min, lat_max, lon_min, lon_max) = geo::bounding_box(point, config.radius_m);
        Self {
            center: *point,
            radius_m: config.radius_m,
            window_hours: config.window_hours,
            since_unix: since.timestamp(),
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Exact test applied to bounding-box survivors.
    pub fn within_radius(&self, other: &GeoPoint) -> bool {
        geo::haversine_m(&self.center, other) <= self.radius_m
    }
}
