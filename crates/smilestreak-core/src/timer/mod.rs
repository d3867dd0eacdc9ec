mod engine;

pub use engine::{SmileTimer, TimerPhase, TimerState, TimerTick};
