//! A triangle with interleaved position and color attributes.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, PassAction, PipelineDesc, PipelineHandle,
    ShaderDesc, VertexFormat, VertexLayout,
};
use ticker_engine::window::AppDesc;

pub const TITLE: &str = "Stock Ticker";

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

pub const VERTICES: [ColorVertex; 3] = [
    ColorVertex {
        position: [-0.5, -0.5, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    ColorVertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    ColorVertex {
        position: [0.0, 0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
];

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

pub fn shader_desc(_kind: BackendKind) -> ShaderDesc<'static> {
    ShaderDesc::wgsl("attributes shader", include_str!("shaders/vertex_color.wgsl"))
}

pub struct Attributes {
    pipeline: PipelineHandle,
    bindings: Bindings,
    pass_action: PassAction,
}

impl Attributes {
    pub fn init(gfx: &mut dyn Backend) -> Result<Self> {
        let vbuf = gfx
            .create_buffer(
                &BufferDesc::vertices("triangle_vertices", &VERTICES)
                    .with_size(size_of_val(&VERTICES)),
            )
            .context("attributes vertex buffer")?;

        let shader = gfx
            .create_shader(&shader_desc(gfx.backend_kind()))
            .context("attributes shader")?;

        // Offsets and stride are derived: position at 0, color at 12, stride 24.
        let layout = VertexLayout::interleaved(&[VertexFormat::Float3, VertexFormat::Float3]);
        let pipeline = gfx
            .create_pipeline(&PipelineDesc::new("triangle_position", shader, layout))
            .context("attributes pipeline")?;

        Ok(Self {
            pipeline,
            bindings: Bindings::new().vertex(0, vbuf),
            pass_action: PassAction::default(),
        })
    }
}

impl App for Attributes {
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
