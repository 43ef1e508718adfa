//! Great-circle distance.

use stride_types::GeoPoint;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
///
/// Symmetric and zero for identical points. Non-finite coordinates yield a
/// non-finite result instead of an error.
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_m(a.lat, a.lon, b.lat, b.lon)
}

/// Haversine distance between two raw `(lat, lon)` pairs, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
