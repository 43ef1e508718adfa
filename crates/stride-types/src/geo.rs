//! Location sample definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single location sample.
///
/// Coordinates are in decimal degrees. Speed and timestamp are carried
/// through when the upstream record provides them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    /// Reported speed, in the unit of the upstream service.
    pub speed: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl GeoPoint {
    /// Fallback location used when no sample is available.
    pub const ORIGIN: GeoPoint = GeoPoint::at(0.0, 0.0);

    /// Creates a point with coordinates only.
    pub const fn at(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            speed: None,
            timestamp: None,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}
