//! Mission progress state machine.

use crate::clock::Clock;
use crate::error::MissionError;
use crate::session_log::SessionLog;
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stride_location::{progress_since, LocationFeed};
use stride_types::{GeoPoint, Goal, MissionStatus, ProgressReading, StatusSnapshot};

/// Static settings for one mission session.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub mission_name: String,
    pub goal: Goal,
    /// Root directory for session logs.
    pub progress_dir: PathBuf,
}

/// Mutable state of a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub start_time: DateTime<Local>,
    pub start_location: GeoPoint,
    pub cumulative_distance_m: f64,
    pub elapsed_min: f64,
    pub status: MissionStatus,
}

/// Tracks distance and time for one mission session against its goal.
///
/// Success is checked on every [`update`](Self::update). Failure is only
/// decided by [`finalize`](Self::finalize), the explicit end of the session.
/// Once the status leaves `Active` it never changes again.
pub struct ProgressTracker {
    config: TrackerConfig,
    feed: Arc<dyn LocationFeed>,
    clock: Arc<dyn Clock>,
    log: SessionLog,
    state: ProgressState,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("config", &self.config)
            .field("log", &self.log)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    /// Starts a session: records the start time and location and writes the
    /// session log header.
    ///
    /// The start location is the latest point the feed returns for "now".
    /// If the feed has nothing usable, or cannot be reached, the origin is
    /// used instead.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::SessionLog`] if the log file cannot be created.
    pub async fn start(
        config: TrackerConfig,
        feed: Arc<dyn LocationFeed>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MissionError> {
        let start_time = clock.now();

        let start_location = match feed.points_since(start_time.naive_local()).await {
            Ok(batch) => batch.latest_point().unwrap_or(GeoPoint::ORIGIN),
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch start location, using origin");
                GeoPoint::ORIGIN
            }
        };

        let header = session_header(&config, start_time, &start_location);
        let log = SessionLog::create(&config.progress_dir, start_time, &header).await?;

        tracing::info!(
            mission = %config.mission_name,
            start_time = %start_time,
            start_location = %start_location,
            log = %log.path().display(),
            "mission started"
        );

        Ok(Self {
            config,
            feed,
            clock,
            log,
            state: ProgressState {
                start_time,
                start_location,
                cumulative_distance_m: 0.0,
                elapsed_min: 0.0,
                status: MissionStatus::Active,
            },
        })
    }

    /// Refreshes distance and elapsed time and checks for success.
    ///
    /// The distance is recomputed over the whole session window and replaces
    /// the stored total. A tick without enough data, or with a zero total,
    /// keeps the previous value; so does a total lower than the stored one,
    /// which keeps the distance non-decreasing. One audit line is appended to
    /// the session log per successful call.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::Location`] when the feed cannot be queried, in
    /// which case the state is left untouched and nothing is logged.
    pub async fn update(&mut self) -> Result<ProgressReading, MissionError> {
        let summary = progress_since(self.feed.as_ref(), self.query_since()).await?;

        match summary {
            Some(s) if s.distance_travelled_m > 0.0 => {
                if s.distance_travelled_m >= self.state.cumulative_distance_m {
                    self.state.cumulative_distance_m = s.distance_travelled_m;
                } else {
                    tracing::warn!(
                        computed_m = s.distance_travelled_m,
                        stored_m = self.state.cumulative_distance_m,
                        "computed distance went backwards, keeping stored total"
                    );
                }
            }
            _ => tracing::debug!("no new distance data this tick"),
        }

        let now = self.clock.now();
        self.state.elapsed_min = minutes_between(self.state.start_time, now);

        let line = format!(
            "[{}] Distance: {:.2} km | Time: {:.1} min\n",
            now.format("%H:%M:%S"),
            self.state.cumulative_distance_m / 1000.0,
            self.state.elapsed_min
        );
        self.log.append(&line).await?;

        tracing::info!(
            mission = %self.config.mission_name,
            distance_m = self.state.cumulative_distance_m,
            elapsed_min = self.state.elapsed_min,
            "mission progress"
        );

        if self.state.status == MissionStatus::Active && self.goal_met() {
            self.state.status = MissionStatus::Success;
            tracing::info!(mission = %self.config.mission_name, "mission goal reached");
        }

        Ok(self.reading())
    }

    /// Ends the session: performs a last update, evaluates the goal and
    /// appends the terminal record.
    ///
    /// Calling this more than once re-evaluates and appends another terminal
    /// record; callers are expected to finalize a session only once. A status
    /// that is already terminal is never overwritten.
    ///
    /// # Errors
    ///
    /// Propagates errors from the final update and from the session log.
    pub async fn finalize(&mut self) -> Result<MissionStatus, MissionError> {
        self.update().await?;

        let evaluated = if self.goal_met() {
            MissionStatus::Success
        } else {
            MissionStatus::Failure
        };

        let result = if self.state.status.is_terminal() {
            if self.state.status != evaluated {
                tracing::warn!(
                    status = %self.state.status,
                    evaluated = %evaluated,
                    "session already ended, keeping recorded result"
                );
            }
            self.state.status
        } else {
            self.state.status = evaluated;
            evaluated
        };

        let record = format!(
            "\n=== Mission Ended ===\nEnd time: {}\nResult: {}\n",
            self.clock.now().format("%Y-%m-%d %H:%M:%S"),
            result
        );
        self.log.append(&record).await?;

        tracing::info!(mission = %self.config.mission_name, result = %result, "mission ended");
        Ok(result)
    }

    /// Returns `true` when the measured values satisfy the goal.
    pub fn is_success(&self, distance_m: f64, elapsed_min: f64) -> bool {
        self.config.goal.is_met(distance_m, elapsed_min)
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn status(&self) -> MissionStatus {
        self.state.status
    }

    pub fn goal(&self) -> Goal {
        self.config.goal
    }

    pub fn mission_name(&self) -> &str {
        &self.config.mission_name
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// The current figures as a status snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.reading().into()
    }

    fn reading(&self) -> ProgressReading {
        ProgressReading {
            distance_m: self.state.cumulative_distance_m,
            elapsed_min: self.state.elapsed_min,
            status: self.state.status,
        }
    }

    fn goal_met(&self) -> bool {
        self.is_success(self.state.cumulative_distance_m, self.state.elapsed_min)
    }

    /// Start of the query window: local midnight of the session's start date.
    fn query_since(&self) -> NaiveDateTime {
        self.state.start_time.date_naive().and_time(NaiveTime::MIN)
    }
}

fn minutes_between(start: DateTime<Local>, end: DateTime<Local>) -> f64 {
    let millis = (end - start).num_milliseconds().max(0);
    millis as f64 / 60_000.0
}

fn session_header(config: &TrackerConfig, start_time: DateTime<Local>, start: &GeoPoint) -> String {
    let mut header = String::new();
    let _ = writeln!(header, "Mission: {}", config.mission_name);
    let _ = writeln!(header, "Start time: {}", start_time.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(header, "Start location: {}", start);
    if let Some(goal_m) = config.goal.distance_goal_m.filter(|g| *g > 0.0) {
        let _ = writeln!(header, "Goal: {:.2} km", goal_m / 1000.0);
    }
    if let Some(limit) = config.goal.time_goal_min.filter(|t| *t > 0.0) {
        let _ = writeln!(header, "Time limit: {:.0} min", limit);
    }
    header.push_str("\n=== Progress ===\n");
    header
}
