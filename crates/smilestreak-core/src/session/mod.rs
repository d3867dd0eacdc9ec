mod controller;
mod frames;

pub use controller::{run_frame_loop, SessionController};
pub use frames::{FrameSource, ScriptedFrame, ScriptedFrames, StopHandle};
