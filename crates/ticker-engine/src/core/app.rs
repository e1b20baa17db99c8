use crate::gfx::Backend;
use crate::input::{InputEvent, Key};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Callbacks an exercise implements.
///
/// The value itself is created by the init closure handed to the driver, so
/// everything built during init (buffers, pipelines, bindings) lives in the
/// implementing type rather than in globals.
pub trait App {
    /// Called once per display refresh. Must begin, fill, end and commit one pass.
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called for every input event. Escape key-down requests exit.
    fn event(&mut self, event: &InputEvent) -> AppControl {
        if event.is_key_down(Key::Escape) {
            AppControl::Exit
        } else {
            AppControl::Continue
        }
    }

    /// Called once before the backend releases its resources.
    fn cleanup(&mut self, gfx: &mut dyn Backend) {
        let _ = gfx;
    }
}
