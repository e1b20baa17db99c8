//! Opens a window and clears it every frame.

use anyhow::Result;
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{Backend, PassAction};
use ticker_engine::window::AppDesc;

pub const TITLE: &str = "sokol app";

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

pub struct Clear {
    pass_action: PassAction,
}

impl Clear {
    pub fn init(_gfx: &mut dyn Backend) -> Result<Self> {
        Ok(Self {
            pass_action: PassAction::default(),
        })
    }
}

impl App for Clear {
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        ctx.gfx.begin_pass(&self.pass_action);
        ctx.gfx.end_pass();
        ctx.gfx.commit();
        AppControl::Continue
    }
}
