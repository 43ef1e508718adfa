//! Tolerant coordinate resolution for location records.
//!
//! Upstream services disagree on key names, so a record is probed with a
//! fixed list of key pairs. The order of the lists decides which pair wins
//! when a record carries more than one; do not reorder them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use stride_types::GeoPoint;

const LAT_KEYS: [&str; 3] = ["lat", "latitude", "lat_deg"];
const LON_KEYS: [&str; 4] = ["lon", "lng", "longitude", "lon_deg"];

const NESTED_KEY: &str = "location";
const NESTED_LAT_KEYS: [&str; 2] = ["lat", "latitude"];
const NESTED_LON_KEYS: [&str; 3] = ["lon", "lng", "longitude"];

/// Resolves `(lat, lon)` from a raw location record.
///
/// Flat key pairs are tried first (latitude key outer, longitude key inner),
/// then the same probe one level down under `"location"`. Returns `None`
/// when no pair resolves to two numbers.
pub fn extract_coordinates(record: &Value) -> Option<(f64, f64)> {
    let obj = record.as_object()?;

    if let Some(coords) = probe(obj, &LAT_KEYS, &LON_KEYS) {
        return Some(coords);
    }

    obj.get(NESTED_KEY)
        .and_then(Value::as_object)
        .and_then(|nested| probe(nested, &NESTED_LAT_KEYS, &NESTED_LON_KEYS))
}

/// Converts a raw record into a [`GeoPoint`], or `None` when it has no
/// resolvable coordinates.
pub fn parse_point(record: &Value) -> Option<GeoPoint> {
    let (lat, lon) = extract_coordinates(record)?;
    let obj = record.as_object();
    Some(GeoPoint {
        lat,
        lon,
        speed: obj.and_then(|o| o.get("speed")).and_then(number),
        timestamp: obj.and_then(|o| o.get("timestamp")).and_then(timestamp),
    })
}

fn probe(obj: &Map<String, Value>, lat_keys: &[&str], lon_keys: &[&str]) -> Option<(f64, f64)> {
    for lat_key in lat_keys {
        for lon_key in lon_keys {
            if let (Some(lat), Some(lon)) = (obj.get(*lat_key), obj.get(*lon_key)) {
                // A pair that is present but not numeric falls through to the next variant.
                if let (Some(lat), Some(lon)) = (number(lat), number(lon)) {
                    return Some((lat, lon));
                }
            }
        }
    }
    None
}

/// Reads a JSON number or a numeric string. `"NaN"` and `"inf"` are rejected.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// Reads unix seconds or an RFC 3339 string.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| s.trim().parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0))),
        _ => None,
    }
}
