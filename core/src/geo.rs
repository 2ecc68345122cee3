//! Geo-point math for the duplicate filter.
//!
//! The store prefilters candidates with a latitude/longitude bounding box
//! (index-friendly), then the exact haversine distance decides. At a 50 m
//! radius the spherical-earth error is far below a meter.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEG: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::validation(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::validation(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        Ok(())
    }
}

/// Great-circle distance between two points, in meters.
pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Bounding box around `center` guaranteed to contain every point within
/// `radius_m`. Returned as (lat_min, lat_max, lon_min, lon_max).
pub fn bounding_box(center: &GeoPoint, radius_m: f64) -> (f64, f64, f64, f64) {
    let d_lat = radius_m / METERS_PER_DEG;
    // Longitude degrees shrink with latitude; clamp the cosine so the box
    // stays finite near the poles (it degrades to a full band there).
    let cos_lat = center.latitude.to_radians().cos().max(0.01);
    let d_lon = radius_m / (METERS_PER_DEG * cos_lat);

    (
        (center.latitude - d_lat).max(-90.0),
        (center.latitude + d_lat).min(90.0),
        (center.longitude - d_lon).max(-180.0),
        (center.longitude + d_lon).min(180.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(73.8567, 18.5204);
        assert!(haversine_m(&p, &p) < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(73.0, 18.0);
        let b = GeoPoint::new(73.0, 19.0);
        let d = haversine_m(&a, &b);
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn fifty_meter_offset_measures_close_to_fifty() {
        // ~50 m north of the reference point.
        let a = GeoPoint::new(73.8567, 18.5204);
        let b = GeoPoint::new(73.8567, 18.5204 + 50.0 / 111_195.0);
        let d = haversine_m(&a, &b);
        assert!((d - 50.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn bounding_box_contains_radius() {
        let c = GeoPoint::new(73.8567, 18.5204);
        let (lat_min, lat_max, lon_min, lon_max) = bounding_box(&c, 50.0);
        // A point 49 m east must fall inside the box.
        let east = GeoPoint::new(
            c.longitude + 49.0 / (111_195.0 * c.latitude.to_radians().cos()),
            c.latitude,
        );
        assert!(east.latitude >= lat_min && east.latitude <= lat_max);
        assert!(east.longitude >= lon_min && east.longitude <= lon_max);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(GeoPoint::new(181.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, 91.0).validate().is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
        assert!(GeoPoint::new(73.8567, 18.5204).validate().is_ok());
    }
}
