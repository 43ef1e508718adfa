//! Fakes for driving a mission monitor without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use futures_util::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stride_location::{LocationError, LocationFeed, PointBatch, EARTH_RADIUS_M};
use stride_mission::{Clock, ProgressTracker, TrackerConfig};
use stride_narration::{
    NarrationError, NarrationPipeline, ScriptTemplates, SpeechChunk, SpeechStream,
    SpeechSynthesizer, StoryLayout, VoiceParams,
};
use stride_types::Goal;

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn at_start() -> Arc<Self> {
        let start = Local
            .with_ymd_and_hms(2025, 6, 1, 8, 0, 0)
            .single()
            .expect("unambiguous local time");
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// A feed response observed at a given session minute. `None` is a failed fetch.
pub type Step = (f64, Option<f64>);

/// Replays scripted track lengths, moving the clock to each step's minute.
/// Once the script runs out it keeps returning an empty batch.
pub struct ScriptedFeed {
    clock: Arc<ManualClock>,
    origin: DateTime<Local>,
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(clock: Arc<ManualClock>, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            origin: clock.now(),
            clock,
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationFeed for ScriptedFeed {
    async fn points_since(&self, _since: NaiveDateTime) -> Result<PointBatch, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        let Some((minute, meters)) = step else {
            return Ok(PointBatch::default());
        };

        self.clock
            .set(self.origin + Duration::milliseconds((minute * 60_000.0) as i64));
        match meters {
            Some(m) => Ok(PointBatch::new(track(m))),
            None => Err(LocationError::FetchFailed("connection reset".to_string())),
        }
    }
}

/// A straight northward track from the origin covering `meters`.
pub fn track(meters: f64) -> Vec<serde_json::Value> {
    (0..=4)
        .map(|i| {
            let m = meters * f64::from(i) / 4.0;
            serde_json::json!({"lat": (m / EARTH_RADIUS_M).to_degrees(), "lon": 0.0})
        })
        .collect()
}

/// Speech service fake that counts calls and returns fixed audio.
pub struct CountingSynthesizer {
    pub calls: AtomicUsize,
    pub audio: Vec<u8>,
}

impl CountingSynthesizer {
    pub fn new(audio: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            audio: audio.to_vec(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for CountingSynthesizer {
    async fn stream_speech(
        &self,
        _text: &str,
        _params: &VoiceParams,
    ) -> Result<SpeechStream, NarrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let chunks = if self.audio.is_empty() {
            Vec::new()
        } else {
            vec![Ok(SpeechChunk::Audio {
                mime_type: Some("audio/L16;codec=pcm;rate=24000".to_string()),
                data: self.audio.clone(),
            })]
        };
        Ok(stream::iter(chunks).boxed())
    }
}

/// A narration pipeline rooted at `root` with a success template in place.
pub fn narration(root: &Path, synth: Arc<CountingSynthesizer>) -> Arc<NarrationPipeline> {
    std::fs::create_dir_all(root.join("templates")).unwrap();
    std::fs::write(
        root.join("templates/success.md"),
        "{{ game_name }} complete: {{ distance_km }} km in {{ elapsed_min }} min.",
    )
    .unwrap();

    let layout = StoryLayout::new(
        "zombies",
        root.join("stories"),
        root.join("templates"),
        root.join("MAIN_CHARACTER.md"),
    );
    Arc::new(NarrationPipeline::new(
        ScriptTemplates::new(layout),
        synth,
        "Leda",
        1.0,
    ))
}

pub async fn start_tracker(
    root: &Path,
    goal: Goal,
    feed: Arc<ScriptedFeed>,
    clock: Arc<ManualClock>,
) -> ProgressTracker {
    let config = TrackerConfig {
        mission_name: "zombies".to_string(),
        goal,
        progress_dir: root.join("progress"),
    };
    ProgressTracker::start(config, feed, clock).await.unwrap()
}
