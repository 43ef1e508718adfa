//! Scripted feed and manual clock shared by the tracker tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use stride_location::{LocationError, LocationFeed, PointBatch, EARTH_RADIUS_M};
use stride_mission::Clock;

pub fn start_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 6, 1, 8, 0, 0)
        .single()
        .expect("unambiguous local time")
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// One scripted feed response and the session minute it is observed at.
pub struct Step {
    pub minute: f64,
    pub response: Result<Vec<Value>, String>,
}

pub fn ok(minute: f64, records: Vec<Value>) -> Step {
    Step {
        minute,
        response: Ok(records),
    }
}

pub fn fail(minute: f64) -> Step {
    Step {
        minute,
        response: Err("connection reset".to_string()),
    }
}

/// Feed that replays scripted responses and moves the clock to each step's minute.
pub struct ScriptedFeed {
    clock: Arc<ManualClock>,
    origin: DateTime<Local>,
    steps: Mutex<VecDeque<Step>>,
    pub queries: Mutex<Vec<NaiveDateTime>>,
}

impl ScriptedFeed {
    pub fn new(clock: Arc<ManualClock>, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            origin: clock.now(),
            clock,
            steps: Mutex::new(steps.into()),
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LocationFeed for ScriptedFeed {
    async fn points_since(&self, since: NaiveDateTime) -> Result<PointBatch, LocationError> {
        self.queries.lock().unwrap().push(since);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(step) => {
                let offset = Duration::milliseconds((step.minute * 60_000.0) as i64);
                self.clock.set(self.origin + offset);
                step.response
                    .map(PointBatch::new)
                    .map_err(LocationError::FetchFailed)
            }
            None => Ok(PointBatch::default()),
        }
    }
}

/// A straight northward track from the origin covering `meters`.
pub fn track(meters: f64) -> Vec<Value> {
    let steps = 10;
    (0..=steps)
        .map(|i| {
            let m = meters * i as f64 / steps as f64;
            json!({"lat": (m / EARTH_RADIUS_M).to_degrees(), "lon": 0.0})
        })
        .collect()
}
