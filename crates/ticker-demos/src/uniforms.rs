//! A triangle whose fragment color is animated through a uniform block.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, PassAction, PipelineDesc, PipelineHandle,
    ShaderDesc, ShaderStage, UniformBlockDesc, VertexFormat, VertexLayout,
};
use ticker_engine::window::AppDesc;

use crate::triangle::VERTICES;

pub const TITLE: &str = "Uniforms";

/// Uniform slot of [`FsParams`].
pub const UB_FS_PARAMS: usize = 0;

/// Mirrors `FsParams` in `uniform_color.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FsParams {
    pub our_color: [f32; 4],
}

impl FsParams {
    /// Green channel follows `sin(t) / 2`; negative values clamp to black on output.
    pub fn at(elapsed: f32) -> Self {
        Self {
            our_color: [0.1, elapsed.sin() / 2.0, 0.0, 1.0],
        }
    }
}

const UNIFORM_BLOCKS: &[UniformBlockDesc] = &[UniformBlockDesc {
    stage: ShaderStage::Fragment,
    size: size_of::<FsParams>(),
}];

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

pub fn shader_desc(_kind: BackendKind) -> ShaderDesc<'static> {
    ShaderDesc::wgsl("uniforms shader", include_str!("shaders/uniform_color.wgsl"))
        .with_uniforms(UNIFORM_BLOCKS)
}

pub struct Uniforms {
    pipeline: PipelineHandle,
    bindings: Bindings,
    pass_action: PassAction,
}

impl Uniforms {
    pub fn init(gfx: &mut dyn Backend) -> Result<Self> {
        let vbuf = gfx
            .create_buffer(
                &BufferDesc::vertices("triangle_vertices", &VERTICES)
                    .with_size(size_of_val(&VERTICES)),
            )
            .context("uniforms vertex buffer")?;

        let shader = gfx
            .create_shader(&shader_desc(gfx.backend_kind()))
            .context("uniforms shader")?;

        let pipeline = gfx
            .create_pipeline(&PipelineDesc::new(
                "triangle_pipeline",
                shader,
                VertexLayout::interleaved(&[VertexFormat::Float3]),
            ))
            .context("uniforms pipeline")?;

        Ok(Self {
            pipeline,
            bindings: Bindings::new().vertex(0, vbuf),
            pass_action: PassAction::default(),
        })
    }
}

impl App for Uniforms {
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let params = FsParams::at(ctx.elapsed());

        let gfx = &mut *ctx.gfx;
        gfx.begin_pass(&self.pass_action);
        gfx.apply_pipeline(self.pipeline);
        gfx.apply_bindings(&self.bindings);
        gfx.apply_uniforms(UB_FS_PARAMS, bytemuck::bytes_of(&params));
        gfx.draw(0, 3, 1);
        gfx.end_pass();
        gfx.commit();
        AppControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use ticker_engine::gfx::Call;

    #[test]
    fn applies_uniforms_before_each_draw() {
        let (_, gfx) = testing::run(Uniforms::init, 2);

        testing::assert_well_formed_frames(&gfx, 2);
        assert_eq!(gfx.draws(), vec![(0, 3, 1), (0, 3, 1)]);

        let uploads: Vec<_> = gfx
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::ApplyUniforms { slot, data } => Some((*slot, data.len())),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![(0, 16), (0, 16)]);
    }

    #[test]
    fn uploaded_color_is_a_valid_params_block() {
        let (_, gfx) = testing::run(Uniforms::init, 1);

        let data = gfx
            .calls()
            .iter()
            .find_map(|c| match c {
                Call::ApplyUniforms { data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        let params: FsParams = bytemuck::pod_read_unaligned(&data);
        assert_eq!(params.our_color[0], 0.1);
        assert!((-0.5..=0.5).contains(&params.our_color[1]));
        assert_eq!(params.our_color[3], 1.0);
    }

    #[test]
    fn green_follows_half_sine() {
        assert_eq!(FsParams::at(0.0).our_color[1], 0.0);
        let peak = FsParams::at(std::f32::consts::FRAC_PI_2).our_color[1];
        assert!((peak - 0.5).abs() < 1e-6);
    }

    #[test]
    fn shader_declares_one_fragment_block() {
        let desc = shader_desc(BackendKind::Headless);
        assert_eq!(desc.uniform_blocks.len(), 1);
        assert_eq!(desc.uniform_blocks[0].stage, ShaderStage::Fragment);
        assert!(desc.validate().is_ok());
    }
}
