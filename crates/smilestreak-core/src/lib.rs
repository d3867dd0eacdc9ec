//! # SmileStreak Core Library
//!
//! Core logic for a smile challenge: hold a smile in front of the camera
//! until the goal time is reached, and keep a daily streak going. The
//! camera, face model and rendering are external; they feed frames in and
//! subscribe to events.
//!
//! ## Architecture
//!
//! - **Score Engine**: owns the persisted score record, day-streak rules
//!   and schema migration
//! - **Smile Timer**: a clock-driven state machine; the caller invokes
//!   `update()` once per processed frame
//! - **Session Controller**: maps per-frame classifications onto timer
//!   transitions and challenge completions
//! - **Storage**: pluggable key-value stores (memory, JSON files, SQLite)
//!   and TOML configuration
//!
//! ## Key Components
//!
//! - [`ScoreEngine`]: score and streak authority
//! - [`SmileTimer`]: continuous-smile timer
//! - [`SessionController`]: per-frame integration point
//! - [`ScoreStore`]: persistence seam
//! - [`Config`]: application configuration management

pub mod classifier;
pub mod clock;
pub mod error;
pub mod events;
pub mod score;
pub mod session;
pub mod storage;
pub mod timer;

pub use classifier::{Classification, ExpressionScores, FrameResult, SmileClassifier, ThresholdClassifier};
pub use clock::{Clock, DayBoundary, ManualClock, SystemClock};
pub use error::{ConfigError, ControllerError, CoreError, StorageError};
pub use events::{Event, EventBus, EventKind};
pub use score::{CompletionOutcome, ScoreEngine, ScoreRecord, StatsView, StreakTransition};
pub use session::{run_frame_loop, FrameSource, SessionController};
pub use storage::{Config, ScoreStore};
pub use timer::{SmileTimer, TimerPhase, TimerState};
