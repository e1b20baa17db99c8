//! One triangle from three positions.

use anyhow::{Context, Result};
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, PassAction, PipelineDesc, PipelineHandle,
    ShaderDesc, VertexFormat, VertexLayout,
};
use ticker_engine::window::AppDesc;

pub const TITLE: &str = "Triangle";

#[rustfmt::skip]
pub const VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0,
     0.5, -0.5, 0.0,
     0.0,  0.5, 0.0,
];

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

/// Every backend consumes the same WGSL; wgpu translates it.
pub fn shader_desc(_kind: BackendKind) -> ShaderDesc<'static> {
    ShaderDesc::wgsl("triangle shader", include_str!("shaders/position.wgsl"))
}

pub struct Triangle {
    pipeline: PipelineHandle,
    bindings: Bindings,
    pass_action: PassAction,
}

impl Triangle {
    pub fn init(gfx: &mut dyn Backend) -> Result<Self> {
        let vbuf = gfx
            .create_buffer(
                &BufferDesc::vertices("triangle_vertices", &VERTICES)
                    .with_size(size_of_val(&VERTICES)),
            )
            .context("triangle vertex buffer")?;

        let shader = gfx
            .create_shader(&shader_desc(gfx.backend_kind()))
            .context("triangle shader")?;

        let pipeline = gfx
            .create_pipeline(&PipelineDesc::new(
                "triangle_pipeline",
                shader,
                VertexLayout::interleaved(&[VertexFormat::Float3]),
            ))
            .context("triangle pipeline")?;

        Ok(Self {
            pipeline,
            bindings: Bindings::new().vertex(0, vbuf),
            pass_action: PassAction::default(),
        })
    }
}

impl App for Triangle {
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let gfx = &mut *ctx.gfx;
        gfx.begin_pass(&self.pass_action);
        gfx.apply_pipeline(self.pipeline);
        gfx.apply_bindings(&self.bindings);
        gfx.draw(0, 3, 1);
        gfx.end_pass();
        gfx.commit();
        AppControl::Continue
    }
}
