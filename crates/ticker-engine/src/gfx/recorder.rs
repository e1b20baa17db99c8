use super::backend::Backend;
use super::desc::{
    BackendKind, Bindings, BufferDesc, BufferUsage, IndexType, PassAction, PipelineDesc,
    PrimitiveType, ShaderDesc,
};
use super::error::GfxError;
use super::handle::{BufferHandle, PipelineHandle, Pool, ShaderHandle};
use super::pass::{PassState, PipelineInfo};

/// One accepted backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer {
        label: Option<String>,
        usage: BufferUsage,
        size: usize,
    },
    CreateShader {
        label: Option<String>,
    },
    CreatePipeline {
        label: Option<String>,
        primitive: PrimitiveType,
        index_type: IndexType,
    },
    BeginPass(PassAction),
    ApplyPipeline(PipelineHandle),
    ApplyBindings(Bindings),
    ApplyUniforms {
        slot: usize,
        data: Vec<u8>,
    },
    Draw {
        base: u32,
        count: u32,
        instances: u32,
    },
    EndPass,
    Commit,
    Shutdown,
}

#[derive(Debug)]
struct RecordedBuffer {
    usage: BufferUsage,
    data: Vec<u8>,
}

/// Headless backend that validates like the GPU backend and records every
/// accepted call.
///
/// Rejected per-frame calls are counted instead of recorded.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Vec<Call>,
    rejected: Vec<GfxError>,

    buffers: Pool<RecordedBuffer>,
    shaders: Pool<Vec<usize>>,
    pipelines: Pool<PipelineInfo>,

    pass: PassState,
    shut_down: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted calls in issue order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Drains the recorded calls, e.g. to inspect one frame at a time.
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Per-frame calls dropped by validation.
    pub fn rejected(&self) -> &[GfxError] {
        &self.rejected
    }

    /// `(base, count, instances)` of every accepted draw.
    pub fn draws(&self) -> Vec<(u32, u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw {
                    base,
                    count,
                    instances,
                } => Some((*base, *count, *instances)),
                _ => None,
            })
            .collect()
    }

    /// Uploaded contents of a live buffer.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer.id()).map(|b| b.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(buffer.id()).map(|b| b.usage)
    }

    /// Number of live resources (buffers + shaders + pipelines).
    pub fn live_resources(&self) -> usize {
        self.buffers.len() + self.shaders.len() + self.pipelines.len()
    }

    fn reject(&mut self, err: GfxError) {
        log::warn!("recorder: dropped call: {err}");
        self.rejected.push(err);
    }
}

impl Backend for Recorder {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Headless
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GfxError> {
        if self.shut_down {
            return Err(GfxError::ShutDown);
        }
        desc.validate()?;

        let id = self.buffers.insert(RecordedBuffer {
            usage: desc.usage,
            data: desc.data.to_vec(),
        });
        self.calls.push(Call::CreateBuffer {
            label: desc.label.map(str::to_string),
            usage: desc.usage,
            size: desc.data.len(),
        });
        Ok(BufferHandle::from_id(id))
    }

    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GfxError> {
        if self.shut_down {
            return Err(GfxError::ShutDown);
        }
        desc.validate()?;

        let sizes = desc.uniform_blocks.iter().map(|b| b.size).collect();
        let id = self.shaders.insert(sizes);
        self.calls.push(Call::CreateShader {
            label: desc.label.map(str::to_string),
        });
        Ok(ShaderHandle::from_id(id))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, GfxError> {
        if self.shut_down {
            return Err(GfxError::ShutDown);
        }

        let uniform_sizes = self
            .shaders
            .get(desc.shader.id())
            .cloned()
            .ok_or(GfxError::InvalidHandle {
                kind: ShaderHandle::KIND,
                id: desc.shader.id(),
            })?;

        let (info, _) = PipelineInfo::new(desc, uniform_sizes)?;
        let id = self.pipelines.insert(info);
        self.calls.push(Call::CreatePipeline {
            label: desc.label.map(str::to_string),
            primitive: desc.primitive,
            index_type: desc.index_type,
        });
        Ok(PipelineHandle::from_id(id))
    }

    fn begin_pass(&mut self, action: &PassAction) {
        if self.shut_down {
            return;
        }
        match self.pass.begin() {
            Ok(()) => self.calls.push(Call::BeginPass(*action)),
            Err(e) => self.reject(e),
        }
    }

    fn apply_pipeline(&mut self, pipeline: PipelineHandle) {
        if self.shut_down {
            return;
        }
        let Some(info) = self.pipelines.get(pipeline.id()).cloned() else {
            self.reject(GfxError::InvalidHandle {
                kind: PipelineHandle::KIND,
                id: pipeline.id(),
            });
            return;
        };
        match self.pass.apply_pipeline(pipeline, info) {
            Ok(()) => self.calls.push(Call::ApplyPipeline(pipeline)),
            Err(e) => self.reject(e),
        }
    }

    fn apply_bindings(&mut self, bindings: &Bindings) {
        if self.shut_down {
            return;
        }
        let buffers = &self.buffers;
        let result = self
            .pass
            .apply_bindings(bindings, |h| buffers.get(h.id()).map(|b| b.data.len() as u64));
        match result {
            Ok(()) => self.calls.push(Call::ApplyBindings(bindings.clone())),
            Err(e) => self.reject(e),
        }
    }

    fn apply_uniforms(&mut self, slot: usize, data: &[u8]) {
        if self.shut_down {
            return;
        }
        match self.pass.apply_uniforms(slot, data.len(), || Ok(())) {
            Ok(()) => self.calls.push(Call::ApplyUniforms {
                slot,
                data: data.to_vec(),
            }),
            Err(e) => self.reject(e),
        }
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        if self.shut_down {
            return;
        }
        if let Err(e) = self.pass.check_draw(base_element, num_elements) {
            self.reject(e);
            return;
        }
        self.calls.push(Call::Draw {
            base: base_element,
            count: num_elements,
            instances: num_instances,
        });
    }

    fn end_pass(&mut self) {
        if self.shut_down {
            return;
        }
        match self.pass.end() {
            Ok(()) => self.calls.push(Call::EndPass),
            Err(e) => self.reject(e),
        }
    }

    fn commit(&mut self) {
        if self.shut_down {
            return;
        }
        if self.pass.is_active() {
            self.reject(GfxError::PassActive);
            let _ = self.pass.end();
        }
        self.calls.push(Call::Commit);
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.buffers.clear();
        self.shaders.clear();
        self.pipelines.clear();
        self.pass = PassState::default();
        self.shut_down = true;
        self.calls.push(Call::Shutdown);
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::desc::{VertexFormat, VertexLayout};

    const SRC: &str = "@vertex fn vs_main() {} @fragment fn fs_main() {}";

    fn triangle(gfx: &mut Recorder) -> (PipelineHandle, BufferHandle) {
        let verts = [0.0f32; 9];
        let vbuf = gfx
            .create_buffer(&BufferDesc::vertices("triangle vertices", &verts))
            .unwrap();
        let shd = gfx.create_shader(&ShaderDesc::wgsl("triangle", SRC)).unwrap();
        let pip = gfx
            .create_pipeline(&PipelineDesc::new(
                "triangle",
                shd,
                VertexLayout::interleaved(&[VertexFormat::Float3]),
            ))
            .unwrap();
        (pip, vbuf)
    }

    #[test]
    fn records_a_complete_frame() {
        let mut gfx = Recorder::new();
        let (pip, vbuf) = triangle(&mut gfx);
        gfx.take_calls();

        gfx.begin_pass(&PassAction::default());
        gfx.apply_pipeline(pip);
        gfx.apply_bindings(&Bindings::new().vertex(0, vbuf));
        gfx.draw(0, 3, 1);
        gfx.end_pass();
        gfx.commit();

        assert_eq!(
            gfx.calls(),
            &[
                Call::BeginPass(PassAction::default()),
                Call::ApplyPipeline(pip),
                Call::ApplyBindings(Bindings::new().vertex(0, vbuf)),
                Call::Draw {
                    base: 0,
                    count: 3,
                    instances: 1
                },
                Call::EndPass,
                Call::Commit,
            ]
        );
        assert!(gfx.rejected().is_empty());
    }

    #[test]
    fn keeps_uploaded_bytes() {
        let mut gfx = Recorder::new();
        let idx: [u16; 3] = [0, 1, 2];
        let h = gfx.create_buffer(&BufferDesc::indices("idx", &idx)).unwrap();
        assert_eq!(gfx.buffer_data(h), Some(bytemuck::cast_slice::<u16, u8>(&idx)));
        assert_eq!(gfx.buffer_usage(h), Some(BufferUsage::Index));
    }

    #[test]
    fn unknown_shader_fails_pipeline_creation() {
        let mut gfx = Recorder::new();
        let desc = PipelineDesc::new("p", ShaderHandle::from_id(9), VertexLayout::default());
        assert_eq!(
            gfx.create_pipeline(&desc),
            Err(GfxError::InvalidHandle {
                kind: "shader",
                id: 9
            })
        );
    }

    #[test]
    fn draw_outside_pass_is_dropped() {
        let mut gfx = Recorder::new();
        gfx.draw(0, 3, 1);
        assert!(gfx.draws().is_empty());
        assert_eq!(gfx.rejected(), &[GfxError::NoPass]);
    }

    #[test]
    fn stale_buffer_handle_is_rejected() {
        let mut gfx = Recorder::new();
        let (pip, _) = triangle(&mut gfx);
        gfx.begin_pass(&PassAction::default());
        gfx.apply_pipeline(pip);
        gfx.apply_bindings(&Bindings::new().vertex(0, BufferHandle::from_id(42)));
        assert!(matches!(
            gfx.rejected(),
            [GfxError::InvalidHandle { kind: "buffer", id: 42 }]
        ));
    }

    #[test]
    fn shutdown_releases_and_silences() {
        let mut gfx = Recorder::new();
        let (pip, vbuf) = triangle(&mut gfx);
        assert_eq!(gfx.live_resources(), 3);

        gfx.shutdown();
        gfx.shutdown();
        assert_eq!(gfx.live_resources(), 0);
        assert!(gfx.is_shut_down());
        let before = gfx.calls().len();

        gfx.begin_pass(&PassAction::default());
        gfx.apply_pipeline(pip);
        gfx.apply_bindings(&Bindings::new().vertex(0, vbuf));
        gfx.draw(0, 3, 1);
        gfx.end_pass();
        gfx.commit();

        assert_eq!(gfx.calls().len(), before);
        assert_eq!(gfx.calls().last(), Some(&Call::Shutdown));
        assert_eq!(
            gfx.create_buffer(&BufferDesc::vertices("late", &[1.0f32])),
            Err(GfxError::ShutDown)
        );
    }

    #[test]
    fn commit_with_open_pass_closes_it() {
        let mut gfx = Recorder::new();
        gfx.begin_pass(&PassAction::default());
        gfx.commit();
        assert_eq!(gfx.rejected(), &[GfxError::PassActive]);

        gfx.begin_pass(&PassAction::default());
        assert_eq!(gfx.rejected().len(), 1);
    }

    #[test]
    fn offset_past_the_buffer_drops_bindings_and_draw() {
        let mut gfx = Recorder::new();
        let (pip, vbuf) = triangle(&mut gfx);
        gfx.take_calls();

        let mut bindings = Bindings::new().vertex(0, vbuf);
        bindings.vertex_buffer_offsets[0] = 4096;

        gfx.begin_pass(&PassAction::default());
        gfx.apply_pipeline(pip);
        gfx.apply_bindings(&bindings);
        gfx.draw(0, 3, 1);
        gfx.end_pass();

        assert_eq!(
            gfx.rejected(),
            &[
                GfxError::BufferOffset {
                    buffer: vbuf.id(),
                    offset: 4096,
                    size: 36
                },
                GfxError::NoBindings,
            ]
        );
        assert!(gfx.draws().is_empty());
    }

    #[test]
    fn short_index_buffer_is_rejected_for_32_bit_indices() {
        let mut gfx = Recorder::new();
        let (_, vbuf) = triangle(&mut gfx);
        let ibuf = gfx
            .create_buffer(&BufferDesc::indices("idx", &[0u16, 1, 2]))
            .unwrap();
        let shd = gfx.create_shader(&ShaderDesc::wgsl("indexed", SRC)).unwrap();
        let pip = gfx
            .create_pipeline(
                &PipelineDesc::new(
                    "indexed",
                    shd,
                    VertexLayout::interleaved(&[VertexFormat::Float3]),
                )
                .indexed(IndexType::Uint32),
            )
            .unwrap();

        gfx.begin_pass(&PassAction::default());
        gfx.apply_pipeline(pip);
        gfx.apply_bindings(&Bindings::new().vertex(0, vbuf).index(ibuf));

        assert_eq!(
            gfx.rejected(),
            &[GfxError::IndexAlignment {
                size: 6,
                offset: 0,
                index_size: 4
            }]
        );
    }

    #[test]
    fn overflowing_draw_is_dropped() {
        let mut gfx = Recorder::new();
        let (pip, vbuf) = triangle(&mut gfx);

        gfx.begin_pass(&PassAction::default());
        gfx.apply_pipeline(pip);
        gfx.apply_bindings(&Bindings::new().vertex(0, vbuf));
        gfx.draw(u32::MAX, 3, 1);

        assert!(gfx.draws().is_empty());
        assert_eq!(
            gfx.rejected(),
            &[GfxError::DrawRange {
                base: u32::MAX,
                count: 3
            }]
        );
    }
}
