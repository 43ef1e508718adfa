mod common;

use common::{fail, ok, start_time, track, ManualClock, ScriptedFeed};
use serde_json::json;
use std::sync::Arc;
use stride_mission::{MissionError, ProgressTracker, TrackerConfig};
use stride_types::{GeoPoint, Goal, MissionStatus};

fn config(dir: &std::path::Path, goal: Goal) -> TrackerConfig {
    TrackerConfig {
        mission_name: "zombies".to_string(),
        goal,
        progress_dir: dir.to_path_buf(),
    }
}

async fn start(
    dir: &std::path::Path,
    goal: Goal,
    steps: Vec<common::Step>,
) -> (ProgressTracker, Arc<ScriptedFeed>) {
    let clock = ManualClock::new(start_time());
    let feed = ScriptedFeed::new(clock.clone(), steps);
    let tracker = ProgressTracker::start(config(dir, goal), feed.clone(), clock)
        .await
        .expect("tracker should start");
    (tracker, feed)
}

fn log_contents(tracker: &ProgressTracker) -> String {
    std::fs::read_to_string(tracker.log_path()).expect("session log should exist")
}

#[tokio::test]
async fn start_writes_header_and_takes_latest_location() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![ok(
        0.0,
        vec![json!({"lat": 1.0, "lon": 2.0}), json!({"lat": 52.1, "lon": 4.3})],
    )];
    let (tracker, _) = start(dir.path(), Goal::new(Some(5000.0), Some(30.0)), steps).await;

    assert_eq!(tracker.state().start_location, GeoPoint::at(52.1, 4.3));
    assert_eq!(tracker.status(), MissionStatus::Active);

    let expected_path = dir
        .path()
        .join("2025-06-01")
        .join("session_08-00-00.txt");
    assert_eq!(tracker.log_path(), expected_path);

    let log = log_contents(&tracker);
    assert!(log.starts_with("Mission: zombies\n"));
    assert!(log.contains("Start time: 2025-06-01 08:00:00\n"));
    assert!(log.contains("Start location: (52.1, 4.3)\n"));
    assert!(log.contains("Goal: 5.00 km\n"));
    assert!(log.contains("Time limit: 30 min\n"));
    assert!(log.ends_with("\n=== Progress ===\n"));
}

#[tokio::test]
async fn start_falls_back_to_origin() {
    let dir = tempfile::tempdir().unwrap();
    let (tracker, _) = start(dir.path(), Goal::default(), vec![fail(0.0)]).await;
    assert_eq!(tracker.state().start_location, GeoPoint::ORIGIN);

    let dir = tempfile::tempdir().unwrap();
    let (tracker, _) = start(dir.path(), Goal::default(), vec![ok(0.0, vec![])]).await;
    assert_eq!(tracker.state().start_location, GeoPoint::ORIGIN);
    assert!(!log_contents(&tracker).contains("Goal:"));
}

#[tokio::test]
async fn update_queries_from_midnight_of_start_date() {
    let dir = tempfile::tempdir().unwrap();
    let (mut tracker, feed) =
        start(dir.path(), Goal::default(), vec![ok(0.0, vec![]), ok(5.0, track(800.0))]).await;

    tracker.update().await.unwrap();

    let queries = feed.queries.lock().unwrap().clone();
    assert_eq!(queries[0], start_time().naive_local());
    assert_eq!(queries[1].to_string(), "2025-06-01 00:00:00");
}

#[tokio::test]
async fn update_replaces_distance_and_logs_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![
        ok(0.0, vec![]),
        ok(5.0, track(1000.0)),
        ok(10.0, track(2500.0)),
    ];
    let (mut tracker, _) = start(dir.path(), Goal::new(Some(5000.0), None), steps).await;

    let first = tracker.update().await.unwrap();
    assert!((first.distance_m - 1000.0).abs() < 1e-6);
    assert!((first.elapsed_min - 5.0).abs() < 1e-9);

    // The second total replaces the first rather than adding to it.
    let second = tracker.update().await.unwrap();
    assert!((second.distance_m - 2500.0).abs() < 1e-6);
    assert!((second.elapsed_min - 10.0).abs() < 1e-9);
    assert_eq!(second.status, MissionStatus::Active);

    let log = log_contents(&tracker);
    let lines: Vec<&str> = log.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(
        lines,
        vec![
            "[08:05:00] Distance: 1.00 km | Time: 5.0 min",
            "[08:10:00] Distance: 2.50 km | Time: 10.0 min",
        ]
    );
}

#[tokio::test]
async fn no_data_keeps_previous_distance() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![
        ok(0.0, vec![]),
        ok(5.0, track(1200.0)),
        ok(6.0, vec![json!({"lat": 0.0, "lon": 0.0})]),
        ok(7.0, vec![json!({"lat": 0.0, "lon": 0.0}), json!({"lat": 0.0, "lon": 0.0})]),
        ok(8.0, track(900.0)),
    ];
    let (mut tracker, _) = start(dir.path(), Goal::default(), steps).await;

    tracker.update().await.unwrap();
    let no_data = tracker.update().await.unwrap();
    assert!((no_data.distance_m - 1200.0).abs() < 1e-6);
    assert!((no_data.elapsed_min - 6.0).abs() < 1e-9);

    let zero = tracker.update().await.unwrap();
    assert!((zero.distance_m - 1200.0).abs() < 1e-6);

    let smaller = tracker.update().await.unwrap();
    assert!((smaller.distance_m - 1200.0).abs() < 1e-6);
}

#[tokio::test]
async fn fetch_failure_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![ok(0.0, vec![]), ok(5.0, track(1000.0)), fail(10.0)];
    let (mut tracker, _) = start(dir.path(), Goal::default(), steps).await;

    tracker.update().await.unwrap();
    let before = tracker.state().clone();
    let log_before = log_contents(&tracker);

    let result = tracker.update().await;
    assert!(matches!(result, Err(MissionError::Location(_))), "got {:?}", result);
    assert_eq!(tracker.state(), &before);
    assert_eq!(log_contents(&tracker), log_before);
}

#[tokio::test]
async fn success_requires_every_goal_component() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![
        ok(0.0, vec![]),
        ok(20.0, track(5100.0)),
        ok(31.0, track(5100.0)),
    ];
    let (mut tracker, _) = start(dir.path(), Goal::new(Some(5000.0), Some(30.0)), steps).await;

    // Distance met, time not yet.
    let reading = tracker.update().await.unwrap();
    assert_eq!(reading.status, MissionStatus::Active);
    assert!(!tracker.is_success(reading.distance_m, reading.elapsed_min));

    let reading = tracker.update().await.unwrap();
    assert_eq!(reading.status, MissionStatus::Success);
    assert!(tracker.snapshot().is_success);
}

#[tokio::test]
async fn update_never_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![ok(0.0, vec![]), ok(600.0, track(10.0))];
    let (mut tracker, _) = start(dir.path(), Goal::new(Some(5000.0), Some(30.0)), steps).await;

    let reading = tracker.update().await.unwrap();
    assert_eq!(reading.status, MissionStatus::Active);
}

#[tokio::test]
async fn finalize_with_unmet_goal_is_failure() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![ok(0.0, vec![]), ok(40.0, track(3000.0))];
    let (mut tracker, _) = start(dir.path(), Goal::new(Some(5000.0), None), steps).await;

    let result = tracker.finalize().await.unwrap();
    assert_eq!(result, MissionStatus::Failure);
    assert!(tracker.snapshot().is_failure);

    let log = log_contents(&tracker);
    assert!(log.contains("\n=== Mission Ended ===\n"));
    assert!(log.contains("End time: 2025-06-01 08:40:00\n"));
    assert!(log.trim_end().ends_with("Result: FAILURE"));
}

#[tokio::test]
async fn finalize_after_success_keeps_success() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![ok(0.0, vec![]), ok(10.0, track(6000.0)), ok(11.0, track(6000.0))];
    let (mut tracker, _) = start(dir.path(), Goal::new(Some(5000.0), None), steps).await;

    assert_eq!(tracker.update().await.unwrap().status, MissionStatus::Success);
    assert_eq!(tracker.finalize().await.unwrap(), MissionStatus::Success);
    assert!(log_contents(&tracker).contains("Result: SUCCESS"));
}

#[tokio::test]
async fn repeated_finalize_appends_duplicate_records_and_keeps_first_result() {
    let dir = tempfile::tempdir().unwrap();
    let steps = vec![
        ok(0.0, vec![]),
        ok(10.0, track(1000.0)),
        ok(50.0, track(7000.0)),
    ];
    let (mut tracker, _) = start(dir.path(), Goal::new(Some(5000.0), None), steps).await;

    assert_eq!(tracker.finalize().await.unwrap(), MissionStatus::Failure);
    // The goal is met by now, but the terminal status is irreversible.
    assert_eq!(tracker.finalize().await.unwrap(), MissionStatus::Failure);
    assert_eq!(tracker.status(), MissionStatus::Failure);

    let log = log_contents(&tracker);
    assert_eq!(log.matches("=== Mission Ended ===").count(), 2);
    assert_eq!(log.matches("Result: FAILURE").count(), 2);
}
