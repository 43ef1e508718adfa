//! Background mission monitor.
//!
//! The monitor is the only writer of mission state. It polls the tracker on
//! a fixed interval, publishes each new [`StatusSnapshot`] on a watch channel
//! for request handlers to read, and narrates the success moment once.

use std::sync::Arc;
use std::time::Duration;
use stride_mission::{MissionError, ProgressTracker};
use stride_narration::{NarrationError, NarrationPipeline, TemplateContext};
use stride_types::{MissionStatus, ProgressReading, StatusSnapshot, VoiceType};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("mission error: {0}")]
    Mission(#[from] MissionError),

    #[error("success narration failed: {0}")]
    Narration(#[from] NarrationError),

    #[error("monitor did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("monitor task failed: {0}")]
    Join(String),
}

/// Polls one mission until it succeeds or is told to stop.
pub struct MissionMonitor {
    tracker: ProgressTracker,
    narration: Arc<NarrationPipeline>,
    interval: Duration,
    status_tx: watch::Sender<StatusSnapshot>,
}

impl MissionMonitor {
    /// Creates the monitor and the receiver side of its status channel.
    pub fn new(
        tracker: ProgressTracker,
        narration: Arc<NarrationPipeline>,
        interval: Duration,
    ) -> (Self, watch::Receiver<StatusSnapshot>) {
        let (status_tx, status_rx) = watch::channel(tracker.snapshot());
        (
            Self {
                tracker,
                narration,
                interval,
                status_tx,
            },
            status_rx,
        )
    }

    /// Runs the monitor on the current runtime.
    pub fn spawn(self) -> MonitorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(stop_rx));
        MonitorHandle { stop_tx, join }
    }

    /// Polling loop. The first update happens immediately.
    ///
    /// Returns the final mission status once the mission has succeeded, or
    /// once `stop` flips to `true` (or its sender is dropped) and the session
    /// has been finalized.
    ///
    /// # Errors
    ///
    /// A failed update is logged and retried on the next tick. Errors are
    /// returned only when finalizing fails or when the success narration
    /// could not be produced. The narration outcome is logged before the
    /// session is finalized, so a finalize error never hides it.
    pub async fn run(
        mut self,
        mut stop: watch::Receiver<bool>,
    ) -> Result<MissionStatus, MonitorError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            mission = %self.tracker.mission_name(),
            interval_secs = self.interval.as_secs_f64(),
            "mission monitor started"
        );

        loop {
            if *stop.borrow_and_update() {
                return self.stop().await;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => {
                    return self.stop().await;
                }
            }

            match self.tracker.update().await {
                Ok(reading) => {
                    self.status_tx.send_replace(reading.into());
                    if reading.status == MissionStatus::Success {
                        return self.complete(reading).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        mission = %self.tracker.mission_name(),
                        error = %e,
                        "progress update failed, retrying next tick"
                    );
                }
            }
        }
    }

    /// Handles the success transition: narrate, then close the session.
    async fn complete(mut self, reading: ProgressReading) -> Result<MissionStatus, MonitorError> {
        let mut context = TemplateContext::new();
        context.insert(
            "distance_km".to_string(),
            format!("{:.2}", reading.distance_m / 1000.0),
        );
        context.insert("elapsed_min".to_string(), format!("{:.1}", reading.elapsed_min));

        let params = self.narration.voice_params(None, None);
        let narrated = self
            .narration
            .narrate(VoiceType::Success, None, &context, &params)
            .await;

        match &narrated {
            Ok(artifact) => {
                tracing::info!(path = %artifact.audio_path.display(), "success narration ready");
            }
            Err(e) => tracing::error!(error = %e, "success narration failed"),
        }

        let finalized = self.tracker.finalize().await;
        self.status_tx.send_replace(self.tracker.snapshot());

        let status = finalized?;
        narrated?;
        Ok(status)
    }

    /// Handles an explicit stop: finalize once if the mission is still open.
    async fn stop(mut self) -> Result<MissionStatus, MonitorError> {
        tracing::info!(mission = %self.tracker.mission_name(), "mission monitor stopping");
        if self.tracker.status().is_terminal() {
            return Ok(self.tracker.status());
        }

        let status = self.tracker.finalize().await?;
        self.status_tx.send_replace(self.tracker.snapshot());
        Ok(status)
    }
}

/// Stop signal and join handle for a spawned [`MissionMonitor`].
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<Result<MissionStatus, MonitorError>>,
}

impl MonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the monitor to end on its own.
    pub async fn wait(self) -> Result<MissionStatus, MonitorError> {
        join_result(self.join.await)
    }

    /// Signals the monitor to stop and waits at most `grace` for it.
    ///
    /// The signal is observed between ticks, so an in-flight update (bounded
    /// by the location request timeout) completes first. On timeout the task
    /// is aborted.
    pub async fn shutdown(self, grace: Duration) -> Result<MissionStatus, MonitorError> {
        let _ = self.stop_tx.send(true);

        let mut join = self.join;
        match tokio::time::timeout(grace, &mut join).await {
            Ok(result) => join_result(result),
            Err(_) => {
                join.abort();
                tracing::warn!(grace_secs = grace.as_secs_f64(), "mission monitor did not stop in time");
                Err(MonitorError::ShutdownTimeout(grace))
            }
        }
    }
}

fn join_result(
    result: Result<Result<MissionStatus, MonitorError>, tokio::task::JoinError>,
) -> Result<MissionStatus, MonitorError> {
    result.map_err(|e| MonitorError::Join(e.to_string()))?
}
