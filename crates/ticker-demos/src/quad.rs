//! A quad from four positions and six 16-bit indices.

use anyhow::{Context, Result};
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, IndexType, PassAction, PipelineDesc,
    PipelineHandle, ShaderDesc, VertexFormat, VertexLayout,
};
use ticker_engine::window::AppDesc;

pub const TITLE: &str = "Quad";

#[rustfmt::skip]
pub const VERTICES: [f32; 12] = [
     0.5,  0.5, 0.0, // top right
     0.5, -0.5, 0.0, // bottom right
    -0.5, -0.5, 0.0, // bottom left
    -0.5,  0.5, 0.0, // top left
];

/// Two triangles sharing the top-right/bottom-left diagonal.
pub const INDICES: [u16; 6] = [0, 1, 3, 1, 2, 3];

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

pub fn shader_desc(_kind: BackendKind) -> ShaderDesc<'static> {
    ShaderDesc::wgsl("quad shader", include_str!("shaders/position.wgsl"))
}

pub struct Quad {
    pipeline: PipelineHandle,
    bindings: Bindings,
    pass_action: PassAction,
}

impl Quad {
    pub fn init(gfx: &mut dyn Backend) -> Result<Self> {
        let vbuf = gfx
            .create_buffer(
                &BufferDesc::vertices("quad_vertices", &VERTICES).with_size(size_of_val(&VERTICES)),
            )
            .context("quad vertex buffer")?;
        let ibuf = gfx
            .create_buffer(
                &BufferDesc::indices("quad_indices", &INDICES).with_size(size_of_val(&INDICES)),
            )
            .context("quad index buffer")?;

        let shader = gfx
            .create_shader(&shader_desc(gfx.backend_kind()))
            .context("quad shader")?;

        let pipeline = gfx
            .create_pipeline(
                &PipelineDesc::new(
                    "quad_pipeline",
                    shader,
                    VertexLayout::interleaved(&[VertexFormat::Float3]),
                )
                .indexed(IndexType::Uint16),
            )
            .context("quad pipeline")?;

        Ok(Self {
            pipeline,
            bindings: Bindings::new().vertex(0, vbuf).index(ibuf),
            pass_action: PassAction::default(),
        })
    }
}

impl App for Quad {
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let gfx = &mut *ctx.gfx;
        gfx.begin_pass(&self.pass_action);
        gfx.apply_pipeline(self.pipeline);
        gfx.apply_bindings(&self.bindings);
        gfx.draw(0, INDICES.len() as u32, 1);
        gfx.end_pass();
        gfx.commit();
        AppControl::Continue
    }
}
