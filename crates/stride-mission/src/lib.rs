//! Mission progress tracking.
//!
//! A [`ProgressTracker`] owns the state of one mission session: when and
//! where it started, how far the runner has gone, how long it has been and
//! whether the goal has been reached. Every update is also written to a
//! plain-text [`SessionLog`] so a session can be audited after the fact.

pub mod clock;
pub mod error;
pub mod session_log;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use error::MissionError;
pub use session_log::SessionLog;
pub use tracker::{ProgressState, ProgressTracker, TrackerConfig};
