//! Fixed-point coordinates and spherical geometry helpers
//!
//! Street coordinates are stored as `i32` fixed-point degrees (degrees × 10^7)
//! so that comparisons and the A* heuristic stay in integer-friendly space.
//! Distances are millimeters throughout.

use geo::HaversineDistance;
use geo::Point;

/// Multiplier between floating degrees and fixed-point `i32` degrees.
pub const FIXED_FACTOR: f64 = 1e7;

/// Circumference of the mean-radius sphere also used for haversine distances.
/// Keeping both on the same sphere keeps heuristic scales consistent with
/// measured edge lengths.
pub const EARTH_CIRCUMFERENCE_METERS: f64 = 40_030_218.0;

/// Millimeters per one fixed-point degree of latitude.
pub const MM_PER_FIXED_DEGREE_LAT: f64 =
    (EARTH_CIRCUMFERENCE_METERS * 1000.0) / (360.0 * FIXED_FACTOR);

/// Convert floating degrees to fixed-point degrees.
#[inline]
pub fn floating_to_fixed(degrees: f64) -> i32 {
    (degrees * FIXED_FACTOR).round() as i32
}

/// Convert fixed-point degrees back to floating degrees.
#[inline]
pub fn fixed_to_floating(fixed: i32) -> f64 {
    fixed as f64 / FIXED_FACTOR
}

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    p1.haversine_distance(&p2)
}

/// Forward bearing in degrees clockwise from north, on the local planar
/// approximation (longitude scaled by the cosine of the latitude). Good enough
/// for classifying turns at a junction; not a great-circle azimuth.
pub fn bearing_degrees(from_fixed: (i32, i32), to_fixed: (i32, i32)) -> f64 {
    let lat_rad = fixed_to_floating(from_fixed.0).to_radians();
    let dy = (to_fixed.0 - from_fixed.0) as f64;
    let dx = (to_fixed.1 - from_fixed.1) as f64 * lat_rad.cos();
    let bearing = dx.atan2(dy).to_degrees();
    if bearing < 0.0 {
        bearing + 360.0
    } else {
        bearing
    }
}
