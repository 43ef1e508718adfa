//! Location tracking for Stride missions.
//!
//! Provides the geodesic helpers used to turn raw location samples into
//! covered distance, and the client that pulls those samples from a
//! location-history service.
//!
//! Records coming back from the service have no fixed schema. They are kept
//! as raw JSON inside a [`PointBatch`] and resolved with
//! [`extract_coordinates`], which probes a fixed, ordered list of key names.

pub mod batch;
pub mod coords;
pub mod distance;
pub mod error;
pub mod feed;


pub use batch::{compute_progress, PointBatch, ProgressSummary};
pub use coords::{extract_coordinates, parse_point};
pub use distance::{distance_m, haversine_m, EARTH_RADIUS_M};
pub use error::LocationError;
pub use feed::{progress_since, DawarichClient, DawarichConfig, HealthStatus, LocationFeed};
