//! Session controller: turns classified frames into timer transitions and
//! score updates.
//!
//! ## Per-frame rules
//!
//! | classification | timer idle            | timer running |
//! |----------------|-----------------------|---------------|
//! | no face        | -                     | reset         |
//! | smiling        | start + `ShowTimer`   | update        |
//! | not smiling    | -                     | reset         |
//!
//! When the timer reports the goal, the controller checks for a new
//! record against pre-completion state, records the challenge, starts the
//! celebration and schedules a timer reset once the animation is over.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::frames::{FrameSource, StopHandle};
use crate::classifier::{Classification, FrameResult, SmileClassifier};
use crate::clock::Clock;
use crate::error::ControllerError;
use crate::events::{Event, EventBus, EventKind};
use crate::score::ScoreEngine;
use crate::storage::Config;
use crate::timer::SmileTimer;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingCelebration {
    due_at: Duration,
    duration_secs: f64,
    is_new_record: bool,
}

pub struct SessionController {
    score: ScoreEngine,
    timer: SmileTimer,
    classifier: Box<dyn SmileClassifier>,
    clock: Arc<dyn Clock>,
    bus: EventBus,
    celebration_delay: Duration,
    camera_active: bool,
    pending: Option<PendingCelebration>,
    stop: StopHandle,
}

impl SessionController {
    pub fn new(
        score: ScoreEngine,
        classifier: Box<dyn SmileClassifier>,
        clock: Arc<dyn Clock>,
        goal_seconds: f64,
        celebration_delay: Duration,
    ) -> Self {
        Self {
            score,
            timer: SmileTimer::new(clock.clone(), goal_seconds),
            classifier,
            clock,
            bus: EventBus::new(),
            celebration_delay,
            camera_active: false,
            pending: None,
            stop: StopHandle::new(),
        }
    }

    /// Build with goal and celebration timings taken from `config`.
    pub fn from_config(
        config: &Config,
        score: ScoreEngine,
        classifier: Box<dyn SmileClassifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            score,
            classifier,
            clock,
            config.challenge.goal_seconds,
            config.celebration.delay(),
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn score(&self) -> &ScoreEngine {
        &self.score
    }

    pub fn score_mut(&mut self) -> &mut ScoreEngine {
        &mut self.score
    }

    pub fn timer(&self) -> &SmileTimer {
        &self.timer
    }

    pub fn is_camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn has_pending_celebration(&self) -> bool {
        self.pending.is_some()
    }

    /// Handle for stopping [`run_frame_loop`] from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to one event kind, wherever it originates.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        match kind {
            EventKind::SessionStarted | EventKind::ScoreUpdated => {
                self.score.subscribe(kind, handler)
            }
            _ => self.bus.subscribe(kind, handler),
        }
    }

    /// Subscribe to every score, timer and celebration event.
    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        let shared = Rc::new(RefCell::new(handler));
        let for_score = Rc::clone(&shared);
        self.score.subscribe_all(move |e| {
            let mut handler = for_score.borrow_mut();
            (*handler)(e)
        });
        self.bus.subscribe_all(move |e| {
            let mut handler = shared.borrow_mut();
            (*handler)(e)
        });
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open the camera and count a new session.
    ///
    /// # Errors
    /// `ClassifierNotReady` while the model loads; `Capture` when the
    /// device cannot be opened. The session is not started in either case.
    pub fn start_camera<S: FrameSource>(&mut self, source: &mut S) -> Result<(), ControllerError> {
        if !self.classifier.is_ready() {
            return Err(ControllerError::ClassifierNotReady);
        }
        if self.camera_active {
            return Ok(());
        }
        source.open().map_err(ControllerError::Capture)?;

        self.camera_active = true;
        self.stop.rearm();
        info!("camera started");
        self.score.start_session();
        Ok(())
    }

    /// Close the camera, cancel any pending celebration and reset the timer.
    pub fn stop_camera<S: FrameSource>(&mut self, source: &mut S) {
        source.close();
        self.camera_active = false;
        self.pending = None;
        let event = self.timer.reset();
        self.bus.publish(&event);
        info!("camera stopped");
    }

    /// Apply one analysed frame. Ignored while the camera is off.
    ///
    /// # Errors
    /// `ClassifierNotReady` if the model became unavailable.
    pub fn process_frame(&mut self, frame: &FrameResult) -> Result<(), ControllerError> {
        if !self.camera_active {
            debug!("frame ignored: camera is off");
            return Ok(());
        }
        if !self.classifier.is_ready() {
            return Err(ControllerError::ClassifierNotReady);
        }

        self.poll();

        let classification = self.classifier.classify(frame);
        self.apply(classification);

        if self.timer.is_running() {
            let tick = self.timer.update();
            for event in &tick.events {
                self.bus.publish(event);
            }
            if tick.goal_reached() {
                if self.pending.is_some() {
                    debug!("goal reached during celebration; not recorded");
                } else {
                    self.complete(tick.elapsed_secs);
                }
            }
        }
        Ok(())
    }

    /// Finish a due celebration. Called on every frame; call it from a
    /// UI timer as well if frames may stop arriving.
    ///
    /// The timer reset at the end applies to whatever run is active then,
    /// including one started during the celebration.
    pub fn poll(&mut self) {
        let Some(pending) = self.pending else {
            return;
        };
        if self.clock.now() < pending.due_at {
            return;
        }
        self.pending = None;

        let stats = self.score.stats();
        let message = self.score.motivational_message();
        self.bus.publish(&Event::CelebrationFinished {
            duration_secs: pending.duration_secs,
            is_new_record: pending.is_new_record,
            message,
            stats,
        });
        let event = self.timer.reset();
        self.bus.publish(&event);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, classification: Classification) {
        let running = self.timer.is_running();
        match classification {
            Classification::NoFace | Classification::NotSmiling if running => {
                debug!(?classification, "smile lost");
                let event = self.timer.reset();
                self.bus.publish(&event);
            }
            Classification::Smiling if !running => {
                if let Some(event) = self.timer.start() {
                    self.bus.publish(&event);
                }
                self.bus.publish(&Event::ShowTimer);
            }
            _ => {}
        }
    }

    fn complete(&mut self, duration_secs: f64) {
        let is_new_record = self.score.is_new_record(duration_secs);
        let outcome = self.score.complete_challenge(duration_secs);
        info!(
            duration_secs,
            is_new_record,
            day_streak = outcome.current_day_streak,
            "challenge completed"
        );

        self.bus.publish(&Event::CelebrationStarted {
            duration_secs,
            is_new_record,
        });
        self.pending = Some(PendingCelebration {
            due_at: self.clock.now() + self.celebration_delay,
            duration_secs,
            is_new_record,
        });
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("timer", &self.timer)
            .field("camera_active", &self.camera_active)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Drive the controller from `source` until the stream ends or the
/// camera is stopped. Returns the number of frames applied.
///
/// Only one frame is ever in flight. A frame that resolves after a stop
/// was requested is discarded.
///
/// # Errors
/// Propagates `ClassifierNotReady` from [`SessionController::process_frame`].
pub async fn run_frame_loop<S: FrameSource>(
    controller: &mut SessionController,
    source: &mut S,
) -> Result<usize, ControllerError> {
    let stop = controller.stop_handle();
    let mut processed = 0;

    while controller.is_camera_active() {
        let Some(frame) = source.next_frame().await else {
            debug!(processed, "frame source exhausted");
            break;
        };
        if stop.is_stopped() {
            debug!("discarding frame that resolved after stop");
            controller.stop_camera(source);
            break;
        }
        controller.process_frame(&frame)?;
        processed += 1;
    }

    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ExpressionScores, ThresholdClassifier};
    use crate::clock::ManualClock;
    use crate::session::frames::{ScriptedFrame, ScriptedFrames};
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    struct Harness {
        clock: Arc<ManualClock>,
        controller: SessionController,
        events: Rc<RefCell<Vec<Event>>>,
        source: ScriptedFrames,
    }

    fn harness() -> Harness {
        harness_with(15.0, Duration::from_millis(2000))
    }

    fn harness_with(goal_seconds: f64, delay: Duration) -> Harness {
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        let score = ScoreEngine::new(Box::new(MemoryStore::new()), "score", clock.clone());
        let mut controller = SessionController::new(
            score,
            Box::new(ThresholdClassifier::default()),
            clock.clone(),
            goal_seconds,
            delay,
        );
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        controller.subscribe_all(move |e| sink.borrow_mut().push(e.clone()));
        let source = ScriptedFrames::new(clock.clone(), Vec::new());
        Harness {
            clock,
            controller,
            events,
            source,
        }
    }

    fn smile() -> FrameResult {
        FrameResult::Face(ExpressionScores::from_pairs([(44, 0.9), (45, 0.8)]))
    }

    fn neutral() -> FrameResult {
        FrameResult::Face(ExpressionScores::from_pairs([(44, 0.1), (45, 0.2)]))
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(Event::kind).collect()
    }

    #[test]
    fn frames_are_ignored_before_camera_starts() {
        let mut h = harness();
        h.controller.process_frame(&smile()).unwrap();
        assert!(!h.controller.timer().is_running());
        assert!(h.events.borrow().is_empty());
    }

    #[test]
    fn smile_starts_and_neutral_resets() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        h.events.borrow_mut().clear();

        h.controller.process_frame(&smile()).unwrap();
        assert!(h.controller.timer().is_running());
        h.clock.advance(Duration::from_secs(2));
        h.controller.process_frame(&smile()).unwrap();
        h.controller.process_frame(&neutral()).unwrap();
        assert!(!h.controller.timer().is_running());

        assert_eq!(
            kinds(&h.events.borrow()),
            vec![
                EventKind::TimerStarted,
                EventKind::ShowTimer,
                EventKind::TimerUpdated,
                EventKind::TimerUpdated,
                EventKind::TimerReset,
            ]
        );
    }

    #[test]
    fn losing_the_face_resets_the_timer() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.controller.process_frame(&FrameResult::NoFace).unwrap();
        assert!(!h.controller.timer().is_running());
    }

    #[test]
    fn goal_records_challenge_then_resets_after_celebration() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_millis(15_500));
        h.events.borrow_mut().clear();
        h.controller.process_frame(&smile()).unwrap();

        assert_eq!(
            kinds(&h.events.borrow()),
            vec![
                EventKind::TimerUpdated,
                EventKind::GoalReached,
                EventKind::ScoreUpdated,
                EventKind::CelebrationStarted,
            ]
        );
        assert_eq!(h.controller.score().record().challenges_completed, 1);
        assert!(h.controller.has_pending_celebration());
        assert!(h.controller.timer().is_running());

        h.clock.advance(Duration::from_millis(1_000));
        h.controller.poll();
        assert!(h.controller.has_pending_celebration());

        h.clock.advance(Duration::from_millis(1_000));
        h.events.borrow_mut().clear();
        h.controller.poll();
        let events = h.events.borrow();
        assert_eq!(
            kinds(&events),
            vec![EventKind::CelebrationFinished, EventKind::TimerReset]
        );
        match &events[0] {
            Event::CelebrationFinished {
                duration_secs,
                is_new_record,
                stats,
                message,
            } => {
                assert!((duration_secs - 15.5).abs() < 1e-9);
                assert!(is_new_record);
                assert_eq!(stats.challenges_completed, 1);
                assert_eq!(stats.longest_smile, 15.5);
                assert!(message.contains("today's challenge"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!h.controller.timer().is_running());
    }

    #[test]
    fn goal_during_celebration_is_not_recorded() {
        let mut h = harness_with(1.0, Duration::from_secs(2));
        h.controller.start_camera(&mut h.source).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_millis(1_100));
        h.controller.process_frame(&smile()).unwrap();
        h.controller.process_frame(&neutral()).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_millis(1_200));
        h.controller.process_frame(&smile()).unwrap();

        h.clock.advance(Duration::from_secs(5));
        h.controller.poll();

        let events = kinds(&h.events.borrow());
        let count = |kind: EventKind| events.iter().filter(|k| **k == kind).count();
        assert_eq!(count(EventKind::GoalReached), 2);
        assert_eq!(count(EventKind::CelebrationStarted), 1);
        assert_eq!(count(EventKind::CelebrationFinished), 1);
        assert_eq!(h.controller.score().record().challenges_completed, 1);
        assert!(!h.controller.has_pending_celebration());
    }

    #[test]
    fn celebration_end_resets_a_run_started_meanwhile() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_millis(15_500));
        h.controller.process_frame(&smile()).unwrap();
        h.controller.process_frame(&neutral()).unwrap();

        h.clock.advance(Duration::from_millis(100));
        h.controller.process_frame(&smile()).unwrap();
        assert!(h.controller.timer().is_running());

        h.clock.advance(Duration::from_millis(1_900));
        h.controller.poll();
        assert!(!h.controller.timer().is_running());
        assert_eq!(h.controller.timer().elapsed_secs(), 0.0);
    }

    #[test]
    fn second_challenge_is_not_a_record_when_shorter() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_secs(17));
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_secs(3));
        h.controller.poll();

        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_secs(15));
        h.events.borrow_mut().clear();
        h.controller.process_frame(&smile()).unwrap();

        let started = h
            .events
            .borrow()
            .iter()
            .find_map(|e| match e {
                Event::CelebrationStarted { is_new_record, .. } => Some(*is_new_record),
                _ => None,
            });
        assert_eq!(started, Some(false));
        assert_eq!(h.controller.score().record().challenges_completed, 2);
        assert_eq!(h.controller.score().record().current_day_streak, 1);
    }

    #[test]
    fn stop_camera_cancels_celebration_and_ignores_later_frames() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_secs(16));
        h.controller.process_frame(&smile()).unwrap();
        h.controller.stop_camera(&mut h.source);

        assert!(!h.controller.has_pending_celebration());
        assert!(!h.controller.timer().is_running());

        h.events.borrow_mut().clear();
        h.controller.process_frame(&smile()).unwrap();
        h.clock.advance(Duration::from_secs(5));
        h.controller.poll();
        assert!(h.events.borrow().is_empty());
    }

    #[test]
    fn start_camera_counts_a_session() {
        let mut h = harness();
        h.controller.start_camera(&mut h.source).unwrap();
        assert_eq!(h.controller.score().record().total_sessions, 1);
        assert_eq!(
            kinds(&h.events.borrow()),
            vec![EventKind::SessionStarted, EventKind::ScoreUpdated]
        );
        // already running: no second session
        h.controller.start_camera(&mut h.source).unwrap();
        assert_eq!(h.controller.score().record().total_sessions, 1);
    }

    #[test]
    fn camera_errors_are_advisories() {
        let mut h = harness();
        let mut denied =
            ScriptedFrames::new(h.clock.clone(), Vec::new()).deny_camera("permission denied");
        assert_eq!(
            h.controller.start_camera(&mut denied),
            Err(ControllerError::Capture("permission denied".into()))
        );
        assert!(!h.controller.is_camera_active());
        assert_eq!(h.controller.score().record().total_sessions, 0);
    }

    #[test]
    fn unready_classifier_blocks_camera() {
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        let score = ScoreEngine::new(Box::new(MemoryStore::new()), "score", clock.clone());
        let mut classifier = ThresholdClassifier::default();
        classifier.set_ready(false);
        let mut controller = SessionController::new(
            score,
            Box::new(classifier),
            clock.clone(),
            15.0,
            Duration::from_secs(2),
        );
        let mut source = ScriptedFrames::new(clock, Vec::new());
        assert_eq!(
            controller.start_camera(&mut source),
            Err(ControllerError::ClassifierNotReady)
        );
    }

    #[tokio::test]
    async fn frame_loop_runs_a_full_challenge() {
        let mut h = harness();
        let mut frames: Vec<ScriptedFrame> =
            (0..=160).map(|i| ScriptedFrame::smiling(i * 100)).collect();
        frames.extend((161..=190).map(|i| ScriptedFrame::neutral(i * 100)));
        let mut source = ScriptedFrames::new(h.clock.clone(), frames);

        h.controller.start_camera(&mut source).unwrap();
        let processed = run_frame_loop(&mut h.controller, &mut source).await.unwrap();
        assert_eq!(processed, 191);

        let events = h.events.borrow();
        let goal_count = events
            .iter()
            .filter(|e| matches!(e, Event::GoalReached { .. }))
            .count();
        assert_eq!(goal_count, 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::CelebrationFinished { .. })));
        assert_eq!(h.controller.score().record().challenges_completed, 1);
    }

    #[tokio::test]
    async fn frame_loop_discards_frames_after_stop() {
        let mut h = harness();
        let frames = (0..10).map(|i| ScriptedFrame::smiling(i * 100)).collect();
        let mut source = ScriptedFrames::new(h.clock.clone(), frames);
        h.controller.start_camera(&mut source).unwrap();
        h.controller.stop_handle().stop();

        let processed = run_frame_loop(&mut h.controller, &mut source).await.unwrap();
        assert_eq!(processed, 0);
        assert!(!h.controller.is_camera_active());
        assert!(!h.controller.timer().is_running());
    }
}
