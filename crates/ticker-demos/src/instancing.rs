//! 100 small quads from one vertex buffer and a per-instance offset buffer.

use anyhow::{Context, Result};
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, BufferLayout, PassAction, PipelineDesc,
    PipelineHandle, ShaderDesc, VertexAttr, VertexFormat, VertexLayout,
};
use ticker_engine::instancing::InstanceGrid;
use ticker_engine::window::AppDesc;

pub const TITLE: &str = "Instancing...";

/// Quad of side 0.1 as two triangles.
#[rustfmt::skip]
pub const QUAD: [[f32; 2]; 6] = [
    [-0.05,  0.05], // top left
    [ 0.05, -0.05], // bottom right
    [-0.05, -0.05], // bottom left

    [-0.05,  0.05], // top left
    [ 0.05, -0.05], // bottom right
    [ 0.05,  0.05], // top right
];

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

pub fn shader_desc(_kind: BackendKind) -> ShaderDesc<'static> {
    ShaderDesc::wgsl("instancing shader", include_str!("shaders/instanced.wgsl"))
}

/// Slot 0 steps per vertex, slot 1 per instance; strides are derived.
pub fn layout() -> VertexLayout {
    VertexLayout {
        buffers: vec![BufferLayout::default(), BufferLayout::per_instance()],
        attrs: vec![
            VertexAttr::new(VertexFormat::Float2),
            VertexAttr::new(VertexFormat::Float2).in_buffer(1),
        ],
    }
}

pub struct Instancing {
    pipeline: PipelineHandle,
    bindings: Bindings,
    instances: u32,
    pass_action: PassAction,
}

impl Instancing {
    pub fn init(gfx: &mut dyn Backend) -> Result<Self> {
        Self::with_grid(gfx, InstanceGrid::default())
    }

    pub fn with_grid(gfx: &mut dyn Backend, grid: InstanceGrid) -> Result<Self> {
        let offsets = grid.generate().context("instance grid")?;
        anyhow::ensure!(!offsets.is_empty(), "instance grid {grid:?} is empty");

        let quad = gfx
            .create_buffer(&BufferDesc::vertices("quad_vertices", &QUAD).with_size(size_of_val(&QUAD)))
            .context("quad vertex buffer")?;
        let instances = gfx
            .create_buffer(&BufferDesc::vertices("offsets", offsets.as_slice()))
            .context("instance offset buffer")?;

        let shader = gfx
            .create_shader(&shader_desc(gfx.backend_kind()))
            .context("instancing shader")?;
        let pipeline = gfx
            .create_pipeline(&PipelineDesc::new("quad_pipeline", shader, layout()))
            .context("instancing pipeline")?;

        log::info!("instancing: {} quads", offsets.len());

        Ok(Self {
            pipeline,
            bindings: Bindings::new().vertex(0, quad).vertex(1, instances),
            instances: offsets.instance_count(),
            pass_action: PassAction::default(),
        })
    }
}

impl App for Instancing {
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let gfx = &mut *ctx.gfx;
        gfx.begin_pass(&self.pass_action);
        gfx.apply_pipeline(self.pipeline);
        gfx.apply_bindings(&self.bindings);
        gfx.draw(0, QUAD.len() as u32, self.instances);
        gfx.end_pass();
        gfx.commit();
        AppControl::Continue
    }
}
