//! Shared types for the Stride mission runner.
//!
//! This crate holds the vocabulary used by every other crate in the
//! workspace: location samples, mission goals, the mission status state
//! and the narration voice types. It carries no I/O so that the location,
//! mission and narration crates can depend on it without depending on each
//! other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod geo;
mod goal;

pub use geo::GeoPoint;
pub use goal::Goal;

/// Lifecycle state of a mission session.
///
/// `Active` is the only non-terminal state. A session leaves it exactly once,
/// for either `Success` or `Failure`, and never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    /// The mission is running and being polled.
    #[default]
    Active,
    /// Every configured goal threshold was met.
    Success,
    /// The session was ended with at least one goal unmet.
    Failure,
}

impl MissionStatus {
    /// Returns the upper-case label used in session logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }

    /// Returns `true` for `Success` and `Failure`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Narration moment categories.
///
/// Each voice type has its own prompt template and its own audio directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceType {
    /// Mission briefing.
    Beginning,
    /// Mid-mission encouragement.
    Interlude,
    /// Goal reached.
    Success,
    /// Session ended without reaching the goal.
    Failure,
}

impl VoiceType {
    /// All voice types in presentation order.
    pub const ALL: [VoiceType; 4] = [
        VoiceType::Beginning,
        VoiceType::Interlude,
        VoiceType::Success,
        VoiceType::Failure,
    ];

    /// Returns the lower-case name used for template files and directories.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginning => "beginning",
            Self::Interlude => "interlude",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`VoiceType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown voice type: {0}")]
pub struct UnknownVoiceType(pub String);

impl FromStr for VoiceType {
    type Err = UnknownVoiceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginning" => Ok(Self::Beginning),
            "interlude" => Ok(Self::Interlude),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(UnknownVoiceType(other.to_string())),
        }
    }
}

/// Measured values produced by one progress update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressReading {
    /// Cumulative distance for the session, in meters.
    pub distance_m: f64,
    /// Wall-clock minutes since the session started.
    pub elapsed_min: f64,
    /// Status after the update was evaluated.
    pub status: MissionStatus,
}

/// Read-only view of a mission published to request handlers.
///
/// Snapshots are immutable; the background task replaces the whole value
/// whenever it has new figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub distance_m: f64,
    pub elapsed_min: f64,
    pub is_success: bool,
    pub is_failure: bool,
    pub is_active: bool,
}

impl StatusSnapshot {
    /// Builds a snapshot from raw figures and a status.
    pub fn new(distance_m: f64, elapsed_min: f64, status: MissionStatus) -> Self {
        Self {
            distance_m,
            elapsed_min,
            is_success: status == MissionStatus::Success,
            is_failure: status == MissionStatus::Failure,
            is_active: status == MissionStatus::Active,
        }
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::new(0.0, 0.0, MissionStatus::Active)
    }
}

impl From<ProgressReading> for StatusSnapshot {
    fn from(reading: ProgressReading) -> Self {
        Self::new(reading.distance_m, reading.elapsed_min, reading.status)
    }
}
