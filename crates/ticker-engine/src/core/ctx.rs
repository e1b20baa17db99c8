use crate::gfx::Backend;
use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;

/// Per-frame context passed to [`App::frame`](super::App::frame).
pub struct FrameCtx<'a> {
    pub gfx: &'a mut dyn Backend,
    pub time: FrameTime,
    pub input: &'a InputState,
    /// Input transitions since the previous frame.
    pub input_frame: &'a InputFrame,
}

impl FrameCtx<'_> {
    /// Seconds since the first frame's clock started.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.time.elapsed
    }
}
