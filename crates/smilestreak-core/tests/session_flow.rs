//! Integration tests for a full camera session.
//!
//! Frames are replayed through the session controller against real
//! file and SQLite stores, and the resulting record is reloaded from disk.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use chrono::NaiveDate;
use smilestreak_core::session::{ScriptedFrame, ScriptedFrames};
use smilestreak_core::storage::{FileStore, SqliteStore};
use smilestreak_core::{
    run_frame_loop, Config, ControllerError, Event, EventKind, ManualClock, ScoreEngine,
    ScoreStore, SessionController, ThresholdClassifier,
};

const KEY: &str = "smile-detector-score";

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

/// Smiling frames every 500 ms from 0 to `until_ms`, then a frame with no face.
fn smile_script(until_ms: u64) -> Vec<ScriptedFrame> {
    let mut frames: Vec<ScriptedFrame> = (0..=until_ms / 500)
        .map(|i| ScriptedFrame::smiling(i * 500))
        .collect();
    frames.push(ScriptedFrame::no_face(until_ms + 500));
    frames
}

fn controller(
    store: Box<dyn ScoreStore>,
    clock: &Arc<ManualClock>,
) -> (SessionController, Rc<RefCell<Vec<Event>>>) {
    let config = Config::default();
    let engine = ScoreEngine::new(store, KEY, clock.clone());
    let classifier = ThresholdClassifier::from_config(&config.detection);
    let mut controller =
        SessionController::from_config(&config, engine, Box::new(classifier), clock.clone());

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    controller.subscribe_all(move |e| sink.borrow_mut().push(e.clone()));
    (controller, events)
}

#[tokio::test]
async fn test_full_session_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(day()));
    let store = FileStore::open(dir.path()).unwrap();
    let (mut controller, events) = controller(Box::new(store), &clock);

    let mut source = ScriptedFrames::new(clock.clone(), smile_script(17_000));
    controller.start_camera(&mut source).unwrap();
    let processed = run_frame_loop(&mut controller, &mut source).await.unwrap();
    assert_eq!(processed, 36);

    let kinds: Vec<EventKind> = events.borrow().iter().map(Event::kind).collect();
    assert_eq!(kinds[0], EventKind::SessionStarted);
    assert!(kinds.contains(&EventKind::TimerStarted));
    assert_eq!(
        kinds.iter().filter(|k| **k == EventKind::GoalReached).count(),
        1
    );
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == EventKind::CelebrationStarted)
            .count(),
        1
    );
    assert!(kinds.contains(&EventKind::CelebrationFinished));

    // Reopen from disk.
    let reopened = FileStore::open(dir.path()).unwrap();
    let engine = ScoreEngine::new(Box::new(reopened), KEY, clock.clone());
    assert_eq!(engine.record().challenges_completed, 1);
    assert_eq!(engine.record().total_sessions, 1);
    assert_eq!(engine.record().current_day_streak, 1);
    assert_eq!(engine.record().last_completion_date, Some(day()));
    assert!(engine.record().longest_smile >= 15.0);
}

#[tokio::test]
async fn test_streak_carries_across_days_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("smilestreak.db");
    let clock = Arc::new(ManualClock::new(day()));

    for _ in 0..3 {
        let store = SqliteStore::open(&db_path).unwrap();
        let (mut controller, _events) = controller(Box::new(store), &clock);
        let mut source = ScriptedFrames::new(clock.clone(), Vec::new());

        controller.start_camera(&mut source).unwrap();
        controller.score_mut().complete_challenge(15.5);
        controller.stop_camera(&mut source);

        clock.advance_days(1);
    }

    let store = SqliteStore::open(&db_path).unwrap();
    let mut engine = ScoreEngine::new(Box::new(store), KEY, clock.clone());
    let stats = engine.stats();
    assert_eq!(stats.current_day_streak, 3);
    assert_eq!(stats.best_day_streak, 3);
    assert_eq!(stats.total_sessions, 3);
    assert!(!stats.today_completed);
}

#[tokio::test]
async fn test_broken_smile_never_completes() {
    let clock = Arc::new(ManualClock::new(day()));
    let (mut controller, events) =
        controller(Box::new(smilestreak_core::storage::MemoryStore::new()), &clock);

    let frames = vec![
        ScriptedFrame::smiling(0),
        ScriptedFrame::smiling(10_000),
        ScriptedFrame::neutral(10_500),
        ScriptedFrame::smiling(11_000),
        ScriptedFrame::smiling(20_000),
        ScriptedFrame::no_face(25_500),
    ];
    let mut source = ScriptedFrames::new(clock.clone(), frames);
    controller.start_camera(&mut source).unwrap();
    run_frame_loop(&mut controller, &mut source).await.unwrap();

    // 11s -> 20s is only 9 s of continuous smiling.
    assert!(!events
        .borrow()
        .iter()
        .any(|e| e.kind() == EventKind::GoalReached));
    assert_eq!(controller.score().record().challenges_completed, 0);
}

#[test]
fn test_camera_denied_does_not_start_session() {
    let clock = Arc::new(ManualClock::new(day()));
    let (mut controller, events) =
        controller(Box::new(smilestreak_core::storage::MemoryStore::new()), &clock);

    let mut source = ScriptedFrames::new(clock.clone(), Vec::new()).deny_camera("permission denied");
    let err = controller.start_camera(&mut source).unwrap_err();

    assert_eq!(err, ControllerError::Capture("permission denied".into()));
    assert!(!controller.is_camera_active());
    assert_eq!(controller.score().record().total_sessions, 0);
    assert!(events.borrow().is_empty());
}
