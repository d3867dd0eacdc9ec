//! Frame sources feeding the session loop.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier::{ExpressionScores, FrameResult};
use crate::clock::ManualClock;

/// A camera plus face model, yielding one analysed frame at a time.
pub trait FrameSource {
    /// Acquire the capture device. The error text is shown to the user.
    fn open(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn close(&mut self) {}

    /// Analyse the next frame. `None` means the stream ended.
    fn next_frame(&mut self) -> impl Future<Output = Option<FrameResult>>;
}

/// Cross-task flag for stopping a running frame loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn rearm(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

/// One line of a frame script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedFrame {
    /// Monotonic timestamp of the frame in milliseconds.
    pub at_ms: u64,
    /// False when no face was detected.
    #[serde(default = "default_face")]
    pub face: bool,
    /// Category index to score.
    #[serde(default)]
    pub scores: BTreeMap<usize, f64>,
}

fn default_face() -> bool {
    true
}

impl ScriptedFrame {
    pub fn smiling(at_ms: u64) -> Self {
        Self {
            at_ms,
            face: true,
            scores: BTreeMap::from([(44, 0.9), (45, 0.9)]),
        }
    }

    pub fn neutral(at_ms: u64) -> Self {
        Self {
            at_ms,
            face: true,
            scores: BTreeMap::from([(44, 0.1), (45, 0.1)]),
        }
    }

    pub fn no_face(at_ms: u64) -> Self {
        Self {
            at_ms,
            face: false,
            scores: BTreeMap::new(),
        }
    }

    fn to_result(&self) -> FrameResult {
        if self.face {
            FrameResult::Face(ExpressionScores::from_pairs(
                self.scores.iter().map(|(&i, &s)| (i, s)),
            ))
        } else {
            FrameResult::NoFace
        }
    }
}

/// Replays a recorded frame script, moving a [`ManualClock`] to each
/// frame's timestamp before yielding it.
#[derive(Debug)]
pub struct ScriptedFrames {
    clock: Arc<ManualClock>,
    frames: std::vec::IntoIter<ScriptedFrame>,
    fail_open: Option<String>,
}

impl ScriptedFrames {
    pub fn new(clock: Arc<ManualClock>, mut frames: Vec<ScriptedFrame>) -> Self {
        frames.sort_by_key(|f| f.at_ms);
        Self {
            clock,
            frames: frames.into_iter(),
            fail_open: None,
        }
    }

    /// Parse a JSON array of [`ScriptedFrame`]s.
    ///
    /// # Errors
    /// Returns the JSON error if the script is malformed.
    pub fn from_json(clock: Arc<ManualClock>, json: &str) -> Result<Self, serde_json::Error> {
        let frames: Vec<ScriptedFrame> = serde_json::from_str(json)?;
        Ok(Self::new(clock, frames))
    }

    /// Make `open()` fail, as a denied camera permission would.
    pub fn deny_camera(mut self, reason: impl Into<String>) -> Self {
        self.fail_open = Some(reason.into());
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedFrames {
    fn open(&mut self) -> Result<(), String> {
        match &self.fail_open {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    async fn next_frame(&mut self) -> Option<FrameResult> {
        let frame = self.frames.next()?;
        // Analysis is asynchronous in a real pipeline; give other tasks a turn.
        tokio::task::yield_now().await;
        self.clock.set_ms(frame.at_ms);
        Some(frame.to_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::clock::Clock;

    #[tokio::test]
    async fn script_advances_clock_in_order() {
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        let mut source = ScriptedFrames::new(
            clock.clone(),
            vec![ScriptedFrame::no_face(200), ScriptedFrame::smiling(100)],
        );

        assert!(matches!(source.next_frame().await, Some(FrameResult::Face(_))));
        assert_eq!(clock.now().as_millis(), 100);
        assert_eq!(source.next_frame().await, Some(FrameResult::NoFace));
        assert_eq!(clock.now().as_millis(), 200);
        assert_eq!(source.next_frame().await, None);
    }

    #[test]
    fn parses_json_script() {
        let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        let json = r#"[{"atMs": 0, "scores": {"44": 0.8}}, {"atMs": 50, "face": false}]"#;
        let source = ScriptedFrames::from_json(clock, json).unwrap();
        assert_eq!(source.remaining(), 2);
    }

    #[test]
    fn stop_handle_is_shared() {
        let handle = StopHandle::new();
        let other = handle.clone();
        other.stop();
        assert!(handle.is_stopped());
        handle.rearm();
        assert!(!other.is_stopped());
    }
}
