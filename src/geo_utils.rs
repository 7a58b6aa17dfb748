//! Geographic utilities: point distances, the compaction distance
//! combination, and decimal rounding.

use geo::{Distance, Geodesic, Haversine, Point};

use crate::TrackPoint;

/// How horizontal distance and elevation delta are combined when deciding
/// whether a point is close enough to its predecessor to discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMode {
    /// Elevation never affects the decision; only the horizontal geodesic
    /// distance is compared against the threshold.
    Horizontal,
    /// Euclidean combination of horizontal distance and elevation delta,
    /// `sqrt(h^2 + de^2)`.
    #[default]
    ThreeDimensional,
}

/// Geodesic (precise) distance between two points in meters.
pub fn geodesic_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    Geodesic::distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

/// Haversine (great-circle) distance between two points in meters.
pub fn haversine_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    Haversine::distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

/// Separation between a point and its predecessor in meters, combined
/// according to `mode`.
///
/// The horizontal term uses the geodesic distance; the vertical term is the
/// raw elevation delta.
pub fn separation(current: &TrackPoint, previous: &TrackPoint, mode: DistanceMode) -> f64 {
    let h = geodesic_distance(current, previous);
    match mode {
        DistanceMode::Horizontal => h,
        DistanceMode::ThreeDimensional => {
            let de = current.elevation - previous.elevation;
            (h * h + de * de).sqrt()
        }
    }
}

/// Round a value to a fixed number of decimal places.
pub fn round_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
