//! Frame timing.
//!
//! The driver owns one `FrameClock` and ticks it once per `frame` callback;
//! exercises read the resulting `FrameTime` (animated uniforms use `elapsed`).

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
