mod common;

use common::{narration, start_tracker, CountingSynthesizer, ManualClock, ScriptedFeed};
use std::time::Duration;
use stride_server::monitor::{MissionMonitor, MonitorError};
use stride_types::{Goal, MissionStatus};

const TICK: Duration = Duration::from_millis(20);

fn session_log(root: &std::path::Path) -> String {
    let day = root.join("progress").join("2025-06-01");
    let entry = std::fs::read_dir(&day)
        .unwrap()
        .next()
        .expect("one session log")
        .unwrap();
    std::fs::read_to_string(entry.path()).unwrap()
}

fn audio_files(root: &std::path::Path) -> Vec<String> {
    match std::fs::read_dir(root.join("stories/zombies/audio/success")) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| !n.ends_with(".txt"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn reaches_success_once_when_both_thresholds_are_crossed() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let clock = ManualClock::at_start();
    let feed = ScriptedFeed::new(
        clock.clone(),
        vec![
            (0.0, Some(0.0)),
            (10.0, Some(1700.0)),
            (20.0, Some(3400.0)),
            (29.0, Some(5100.0)),
            (31.0, Some(5100.0)),
        ],
    );
    let synth = CountingSynthesizer::new(&[0u8; 480]);
    let tracker = start_tracker(
        root,
        Goal::new(Some(5000.0), Some(30.0)),
        feed.clone(),
        clock,
    )
    .await;

    let (monitor, status) = MissionMonitor::new(tracker, narration(root, synth.clone()), TICK);
    let result = tokio::time::timeout(Duration::from_secs(5), monitor.spawn().wait())
        .await
        .expect("monitor should finish on success");

    assert_eq!(result.unwrap(), MissionStatus::Success);
    assert_eq!(synth.calls(), 1, "success is narrated exactly once");
    assert_eq!(audio_files(root).len(), 1);

    let snapshot = *status.borrow();
    assert!(snapshot.is_success);
    assert!(!snapshot.is_active);
    assert!(!snapshot.is_failure);
    assert!((snapshot.distance_m - 5100.0).abs() < 1e-6);
    assert_eq!(snapshot.elapsed_min, 31.0);

    // start, four ticks, one final update; nothing after the transition.
    assert_eq!(feed.calls(), 6);

    let log = session_log(root);
    assert!(log.contains("[08:29:00] Distance: 5.10 km | Time: 29.0 min"));
    assert!(log.contains("[08:31:00] Distance: 5.10 km | Time: 31.0 min"));
    assert_eq!(log.matches("=== Mission Ended ===").count(), 1);
    assert!(log.contains("Result: SUCCESS"));
}

#[tokio::test]
async fn failed_fetch_does_not_stop_polling() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let clock = ManualClock::at_start();
    let feed = ScriptedFeed::new(
        clock.clone(),
        vec![
            (0.0, Some(0.0)),
            (1.0, None),
            (2.0, None),
            (3.0, Some(800.0)),
        ],
    );
    let tracker = start_tracker(root, Goal::new(Some(5000.0), None), feed.clone(), clock).await;

    let (monitor, mut status) =
        MissionMonitor::new(tracker, narration(root, CountingSynthesizer::new(b"x")), TICK);
    let handle = monitor.spawn();

    // The first successful tick comes after two failed ones.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            status.changed().await.unwrap();
            if status.borrow().distance_m > 0.0 {
                break;
            }
        }
    })
    .await
    .expect("polling should continue past failed fetches");

    assert!(status.borrow().is_active);
    assert!((status.borrow().distance_m - 800.0).abs() < 1e-6);
    assert!(feed.calls() >= 4);
    assert!(!handle.is_finished());

    let result = handle.shutdown(Duration::from_secs(5)).await.unwrap();
    assert_eq!(result, MissionStatus::Failure);
}

#[tokio::test]
async fn stop_finalizes_an_open_session_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let clock = ManualClock::at_start();
    let feed = ScriptedFeed::new(clock.clone(), vec![(0.0, Some(0.0)), (5.0, Some(1200.0))]);
    let synth = CountingSynthesizer::new(b"x");
    let tracker = start_tracker(root, Goal::new(Some(5000.0), None), feed, clock).await;

    let (monitor, mut status) = MissionMonitor::new(tracker, narration(root, synth.clone()), TICK);
    let handle = monitor.spawn();
    status.changed().await.unwrap();

    let result = handle.shutdown(Duration::from_secs(5)).await.unwrap();
    assert_eq!(result, MissionStatus::Failure);
    assert!(status.borrow().is_failure);
    assert_eq!(synth.calls(), 0);

    let log = session_log(root);
    assert_eq!(log.matches("=== Mission Ended ===").count(), 1);
    assert!(log.contains("Result: FAILURE"));
}

#[tokio::test]
async fn missing_success_audio_is_reported_after_closing_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let clock = ManualClock::at_start();
    let feed = ScriptedFeed::new(clock.clone(), vec![(0.0, Some(0.0)), (12.0, Some(5200.0))]);
    let synth = CountingSynthesizer::new(&[]);
    let tracker = start_tracker(root, Goal::new(Some(5000.0), None), feed, clock).await;

    let (monitor, status) = MissionMonitor::new(tracker, narration(root, synth.clone()), TICK);
    let result = tokio::time::timeout(Duration::from_secs(5), monitor.spawn().wait())
        .await
        .unwrap();

    assert!(matches!(result, Err(MonitorError::Narration(_))));
    assert_eq!(synth.calls(), 1);
    assert!(status.borrow().is_success);
    assert!(session_log(root).contains("Result: SUCCESS"));
    assert!(audio_files(root).is_empty());
}

#[tokio::test]
async fn shutdown_after_success_returns_recorded_result() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let clock = ManualClock::at_start();
    let feed = ScriptedFeed::new(clock.clone(), vec![(0.0, Some(0.0)), (12.0, Some(5200.0))]);
    let tracker = start_tracker(root, Goal::new(Some(5000.0), None), feed, clock).await;

    let (monitor, mut status) =
        MissionMonitor::new(tracker, narration(root, CountingSynthesizer::new(b"x")), TICK);
    let handle = monitor.spawn();

    tokio::time::timeout(Duration::from_secs(5), async {
        while !status.borrow_and_update().is_success {
            status.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    while !handle.is_finished() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let result = handle.shutdown(Duration::from_secs(1)).await.unwrap();
    assert_eq!(result, MissionStatus::Success);
    assert_eq!(session_log(root).matches("Result: SUCCESS").count(), 1);
}

#[tokio::test]
async fn failed_final_update_still_publishes_success_and_reports_it() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let clock = ManualClock::at_start();
    let feed = ScriptedFeed::new(
        clock.clone(),
        vec![(0.0, Some(0.0)), (12.0, Some(5200.0)), (13.0, None)],
    );
    let synth = CountingSynthesizer::new(&[]);
    let tracker = start_tracker(root, Goal::new(Some(5000.0), None), feed.clone(), clock).await;

    let (monitor, status) = MissionMonitor::new(tracker, narration(root, synth.clone()), TICK);
    let result = tokio::time::timeout(Duration::from_secs(5), monitor.spawn().wait())
        .await
        .unwrap();

    // The narration was attempted before the session close failed.
    assert_eq!(synth.calls(), 1);
    assert!(matches!(result, Err(MonitorError::Mission(_))));
    assert_eq!(feed.calls(), 3);

    let snapshot = *status.borrow();
    assert!(snapshot.is_success);
    assert!((snapshot.distance_m - 5200.0).abs() < 1e-6);
    assert!(!session_log(root).contains("=== Mission Ended ==="));
}
