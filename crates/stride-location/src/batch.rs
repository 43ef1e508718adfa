//! Point batches and distance aggregation.

use crate::coords::{self, extract_coordinates, parse_point};
use crate::distance::haversine_m;
use serde::Serialize;
use serde_json::Value;
use stride_types::GeoPoint;

/// Location records in the order the service returned them.
///
/// Records keep their upstream schema; coordinates are resolved lazily so
/// that malformed entries can be skipped without failing the whole batch.
/// The batch is never re-sorted by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointBatch {
    records: Vec<Value>,
}

impl PointBatch {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Resolvable points, in arrival order.
    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.records.iter().filter_map(parse_point)
    }

    /// The most recent record that resolves to a point.
    pub fn latest_point(&self) -> Option<GeoPoint> {
        self.records.iter().rev().find_map(parse_point)
    }
}

impl From<Vec<Value>> for PointBatch {
    fn from(records: Vec<Value>) -> Self {
        Self::new(records)
    }
}

/// Aggregate movement figures for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSummary {
    /// Sum of consecutive-pair distances, in meters.
    pub distance_travelled_m: f64,
    /// Location of the last record, if it resolves.
    pub latest_location: Option<GeoPoint>,
    /// `speed` of the last record, if present.
    pub latest_speed: Option<f64>,
}

/// Sums the distance covered by a batch.
///
/// Records without resolvable coordinates are dropped. Fewer than two
/// resolvable points is "no data" and yields `None`, which callers must not
/// confuse with a measured distance of zero.
pub fn compute_progress(batch: &PointBatch) -> Option<ProgressSummary> {
    let first = batch.records().first()?;
    if !has_known_shape(first) {
        let keys: Vec<&str> = first
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        tracing::debug!(?keys, "unexpected location record format");
    }

    let resolved: Vec<(f64, f64)> = batch.records().iter().filter_map(extract_coordinates).collect();
    if resolved.len() < 2 {
        tracing::debug!(
            records = batch.len(),
            resolvable = resolved.len(),
            "not enough coordinate data to calculate distance"
        );
        return None;
    }

    let distance_travelled_m = resolved
        .windows(2)
        .map(|pair| haversine_m(pair[0].0, pair[0].1, pair[1].0, pair[1].1))
        .sum();

    let latest = batch.records().last()?;
    Some(ProgressSummary {
        distance_travelled_m,
        latest_location: parse_point(latest),
        latest_speed: latest.get("speed").and_then(coords::number),
    })
}

fn has_known_shape(record: &Value) -> bool {
    ["lat", "latitude", "location"]
        .iter()
        .any(|key| record.get(key).is_some())
}
