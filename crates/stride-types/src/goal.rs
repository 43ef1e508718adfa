//! Mission goal thresholds.

use serde::{Deserialize, Serialize};

/// Distance and time thresholds for a mission.
///
/// A goal is met when every component that is set has been reached; an
/// unset component never blocks success.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Goal {
    /// Distance to cover, in meters.
    #[serde(default)]
    pub distance_goal_m: Option<f64>,
    /// Minutes the session must last.
    #[serde(default)]
    pub time_goal_min: Option<f64>,
}

impl Goal {
    pub fn new(distance_goal_m: Option<f64>, time_goal_min: Option<f64>) -> Self {
        Self {
            distance_goal_m,
            time_goal_min,
        }
    }

    /// Returns `true` when each set threshold is reached (inclusive).
    pub fn is_met(&self, distance_m: f64, elapsed_min: f64) -> bool {
        let distance_ok = self.distance_goal_m.map_or(true, |goal| distance_m >= goal);
        let time_ok = self.time_goal_min.map_or(true, |goal| elapsed_min >= goal);
        distance_ok && time_ok
    }
}
