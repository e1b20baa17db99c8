use std::num::NonZeroU64;

use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, BufferHandle, BufferUsage, GfxError, IndexType,
    LoadAction, PassAction, PassState, PipelineDesc, PipelineHandle, PipelineInfo, Pool,
    PrimitiveType, ResolvedLayout, ShaderDesc, ShaderHandle, ShaderStage, UniformBlockDesc,
    VertexFormat, VertexStep, MAX_UNIFORM_BLOCKS,
};

use super::{GfxDesc, Gpu, GpuFrame, SurfaceErrorAction};

struct ShaderEntry {
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    uniform_blocks: Vec<UniformBlockDesc>,
}

struct PipelineEntry {
    pipeline: wgpu::RenderPipeline,
    info: PipelineInfo,
    /// Uniform blocks at `@group(0)`, bound with dynamic offsets into the ring.
    uniforms: Option<wgpu::BindGroup>,
}

/// [`Backend`] on top of wgpu.
///
/// Passes are encoded immediately: `begin_pass` acquires the swapchain image
/// (once per frame) and opens a wgpu render pass that lives until `end_pass`.
/// Uniform data is staged on the CPU and written to a ring buffer right before
/// `commit` submits the frame.
pub struct WgpuBackend<'w> {
    window: &'w Window,
    gpu: Gpu<'w>,
    kind: BackendKind,

    buffers: Pool<wgpu::Buffer>,
    shaders: Pool<ShaderEntry>,
    pipelines: Pool<PipelineEntry>,

    uniforms: UniformRing,
    pass: PassState,
    /// Declared before `frame` so it drops before the encoder it records into.
    rpass: Option<wgpu::RenderPass<'static>>,
    frame: Option<GpuFrame>,

    lost: bool,
    shut_down: bool,
}

impl<'w> WgpuBackend<'w> {
    pub async fn new(window: &'w Window, desc: &GfxDesc) -> Result<Self> {
        let gpu = Gpu::new(window, desc).await?;
        let kind = gpu.backend_kind();

        let align = gpu.device().limits().min_uniform_buffer_offset_alignment as usize;
        let uniforms = UniformRing::new(gpu.device(), desc.uniform_buffer_size, align);

        Ok(Self {
            window,
            gpu,
            kind,
            buffers: Pool::default(),
            shaders: Pool::default(),
            pipelines: Pool::default(),
            uniforms,
            pass: PassState::default(),
            rpass: None,
            frame: None,
            lost: false,
            shut_down: false,
        })
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if !self.shut_down {
            self.gpu.resize(size);
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    fn drop_call(&self, err: GfxError) {
        log::warn!("dropped graphics call: {err}");
    }

    fn acquire_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }
        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                true
            }
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface failed fatally; treating device as lost");
                    self.lost = true;
                } else {
                    log::debug!("skipping frame: {action:?}");
                }
                false
            }
        }
    }

    fn build_pipeline(
        &self,
        desc: &PipelineDesc<'_>,
        shader: &ShaderEntry,
        layout: &ResolvedLayout,
    ) -> (wgpu::RenderPipeline, Option<wgpu::BindGroup>) {
        let device = self.gpu.device();
        let label = desc.label;

        let uniform_layout = (!shader.uniform_blocks.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = shader
                .uniform_blocks
                .iter()
                .enumerate()
                .map(|(slot, block)| wgpu::BindGroupLayoutEntry {
                    binding: slot as u32,
                    visibility: map_stage(block.stage),
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(block.size as u64),
                    },
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label,
                entries: &entries,
            })
        });

        let bind_group = uniform_layout.as_ref().map(|bgl| {
            let entries: Vec<wgpu::BindGroupEntry> = shader
                .uniform_blocks
                .iter()
                .enumerate()
                .map(|(slot, block)| wgpu::BindGroupEntry {
                    binding: slot as u32,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.uniforms.buffer,
                        offset: 0,
                        size: NonZeroU64::new(block.size as u64),
                    }),
                })
                .collect();

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label,
                layout: bgl,
                entries: &entries,
            })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = uniform_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label,
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = layout
            .buffers
            .iter()
            .map(|b| {
                b.attrs
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: map_vertex_format(a.format),
                        offset: a.offset,
                        shader_location: a.location,
                    })
                    .collect()
            })
            .collect();

        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = layout
            .buffers
            .iter()
            .zip(&attributes)
            .map(|(b, attrs)| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: match b.step {
                    VertexStep::PerVertex => wgpu::VertexStepMode::Vertex,
                    VertexStep::PerInstance => wgpu::VertexStepMode::Instance,
                },
                attributes: attrs,
            })
            .collect();

        let strip_index_format = match desc.primitive {
            PrimitiveType::TriangleStrip | PrimitiveType::LineStrip => {
                map_index_format(desc.index_type)
            }
            _ => None,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label,
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: Some(shader.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: Some(shader.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: map_primitive(desc.primitive),
                strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        (pipeline, bind_group)
    }
}

impl Backend for WgpuBackend<'_> {
    fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GfxError> {
        if self.shut_down {
            return Err(GfxError::ShutDown);
        }
        desc.validate()?;

        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        };

        use wgpu::util::DeviceExt;
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: desc.label,
                contents: desc.data,
                usage,
            });

        log::debug!(
            "created {:?} buffer {:?} ({} bytes)",
            desc.usage,
            desc.label,
            desc.data.len()
        );
        Ok(BufferHandle::from_id(self.buffers.insert(buffer)))
    }

    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GfxError> {
        if self.shut_down {
            return Err(GfxError::ShutDown);
        }
        desc.validate()?;

        // Invalid WGSL is reported by wgpu's uncaptured-error handler, which aborts
        // with the naga diagnostic.
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label,
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });

        let entry = ShaderEntry {
            module,
            vertex_entry: desc.vertex_entry.to_string(),
            fragment_entry: desc.fragment_entry.to_string(),
            uniform_blocks: desc.uniform_blocks.to_vec(),
        };
        Ok(ShaderHandle::from_id(self.shaders.insert(entry)))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, GfxError> {
        if self.shut_down {
            return Err(GfxError::ShutDown);
        }

        let shader = self
            .shaders
            .get(desc.shader.id())
            .ok_or(GfxError::InvalidHandle {
                kind: ShaderHandle::KIND,
                id: desc.shader.id(),
            })?;

        let uniform_sizes = shader.uniform_blocks.iter().map(|b| b.size).collect();
        let (info, layout) = PipelineInfo::new(desc, uniform_sizes)?;
        let (pipeline, uniforms) = self.build_pipeline(desc, shader, &layout);

        log::debug!("created pipeline {:?} ({:?})", desc.label, desc.primitive);
        let id = self.pipelines.insert(PipelineEntry {
            pipeline,
            info,
            uniforms,
        });
        Ok(PipelineHandle::from_id(id))
    }

    fn begin_pass(&mut self, action: &PassAction) {
        if self.shut_down || self.lost {
            return;
        }
        if let Err(e) = self.pass.begin() {
            self.drop_call(e);
            return;
        }
        if !self.acquire_frame() {
            return;
        }
        let Some(frame) = self.frame.as_mut() else { return };

        let load = match action.color {
            LoadAction::Clear(c) => wgpu::LoadOp::Clear(c.to_wgpu()),
            LoadAction::Load => wgpu::LoadOp::Load,
        };

        let rpass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ticker pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.rpass = Some(rpass);
    }

    fn apply_pipeline(&mut self, pipeline: PipelineHandle) {
        if self.shut_down || self.lost {
            return;
        }
        let Some(entry) = self.pipelines.get(pipeline.id()) else {
            self.drop_call(GfxError::InvalidHandle {
                kind: PipelineHandle::KIND,
                id: pipeline.id(),
            });
            return;
        };
        if let Err(e) = self.pass.apply_pipeline(pipeline, entry.info.clone()) {
            self.drop_call(e);
            return;
        }
        if let Some(rpass) = self.rpass.as_mut() {
            rpass.set_pipeline(&entry.pipeline);
        }
    }

    fn apply_bindings(&mut self, bindings: &Bindings) {
        if self.shut_down || self.lost {
            return;
        }
        let buffers = &self.buffers;
        let result = self
            .pass
            .apply_bindings(bindings, |h| buffers.get(h.id()).map(wgpu::Buffer::size));
        if let Err(e) = result {
            self.drop_call(e);
            return;
        }

        let index_format = self
            .pass
            .pipeline()
            .and_then(|(_, info)| map_index_format(info.index_type));

        let Some(rpass) = self.rpass.as_mut() else { return };

        for (slot, handle, offset) in bindings.bound_vertex_buffers() {
            if let Some(buffer) = self.buffers.get(handle.id()) {
                rpass.set_vertex_buffer(slot as u32, buffer.slice(offset..));
            }
        }

        if let (Some(format), Some(handle)) = (index_format, bindings.index_buffer) {
            if let Some(buffer) = self.buffers.get(handle.id()) {
                rpass.set_index_buffer(buffer.slice(bindings.index_buffer_offset..), format);
            }
        }
    }

    fn apply_uniforms(&mut self, slot: usize, data: &[u8]) {
        if self.shut_down || self.lost {
            return;
        }
        let uniforms = &mut self.uniforms;
        let result = self
            .pass
            .apply_uniforms(slot, data.len(), || uniforms.push(slot, data));
        if let Err(e) = result {
            self.drop_call(e);
        }
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        if self.shut_down || self.lost {
            return;
        }
        let (handle, info) = match self.pass.check_draw(base_element, num_elements) {
            Ok(v) => v,
            Err(e) => {
                self.drop_call(e);
                return;
            }
        };
        let Some(rpass) = self.rpass.as_mut() else { return };
        let Some(entry) = self.pipelines.get(handle.id()) else { return };

        if let Some(bind_group) = entry.uniforms.as_ref() {
            let n = info.uniform_sizes.len();
            rpass.set_bind_group(0, bind_group, &self.uniforms.offsets[..n]);
        }

        let Some(end) = base_element.checked_add(num_elements) else { return };
        let range = base_element..end;
        if info.index_type == IndexType::None {
            rpass.draw(range, 0..num_instances);
        } else {
            rpass.draw_indexed(range, 0, 0..num_instances);
        }
    }

    fn end_pass(&mut self) {
        if self.shut_down || self.lost {
            return;
        }
        if let Err(e) = self.pass.end() {
            self.drop_call(e);
            return;
        }
        self.rpass = None;
    }

    fn commit(&mut self) {
        if self.shut_down {
            return;
        }
        if self.pass.is_active() {
            self.drop_call(GfxError::PassActive);
            let _ = self.pass.end();
        }
        self.rpass = None;

        let Some(frame) = self.frame.take() else {
            self.uniforms.reset();
            return;
        };

        self.uniforms.flush(self.gpu.queue());
        self.window.pre_present_notify();
        self.gpu.submit(frame);
    }

    fn is_lost(&self) -> bool {
        self.lost
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.rpass = None;
        self.frame = None;
        self.pass = PassState::default();
        self.pipelines.clear();
        self.shaders.clear();
        self.buffers.clear();
        self.uniforms.reset();
        self.shut_down = true;
        log::info!("graphics backend shut down");
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

/// Per-frame uniform storage: CPU staging plus one GPU buffer.
///
/// Each `apply_uniforms` appends an aligned block and records its offset for
/// the slot; draws bind those offsets dynamically.
struct UniformRing {
    buffer: wgpu::Buffer,
    staging: Vec<u8>,
    capacity: usize,
    align: usize,
    offsets: [u32; MAX_UNIFORM_BLOCKS],
}

impl UniformRing {
    fn new(device: &wgpu::Device, capacity: usize, align: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ticker uniform ring"),
            size: capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            staging: Vec::with_capacity(capacity.min(64 * 1024)),
            capacity,
            align: align.max(1),
            offsets: [0; MAX_UNIFORM_BLOCKS],
        }
    }

    fn push(&mut self, slot: usize, data: &[u8]) -> Result<(), GfxError> {
        let offset = ring_offset(self.staging.len(), data.len(), self.align, self.capacity)?;
        self.staging.resize(offset, 0);
        self.staging.extend_from_slice(data);
        self.offsets[slot] = offset as u32;
        Ok(())
    }

    fn flush(&mut self, queue: &wgpu::Queue) {
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.staging.clear();
        self.offsets = [0; MAX_UNIFORM_BLOCKS];
    }
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// Offset for the next `len`-byte block after `used` staged bytes, or
/// `UniformOverflow` when it would end past `capacity`.
fn ring_offset(used: usize, len: usize, align: usize, capacity: usize) -> Result<usize, GfxError> {
    let offset = align_up(used, align);
    match offset.checked_add(len) {
        Some(end) if end <= capacity && offset <= u32::MAX as usize => Ok(offset),
        _ => Err(GfxError::UniformOverflow { capacity }),
    }
}

fn map_stage(stage: ShaderStage) -> wgpu::ShaderStages {
    match stage {
        ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
        ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
    }
}

fn map_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float => wgpu::VertexFormat::Float32,
        VertexFormat::Float2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float4 => wgpu::VertexFormat::Float32x4,
        VertexFormat::UByte4N => wgpu::VertexFormat::Unorm8x4,
        VertexFormat::Uint => wgpu::VertexFormat::Uint32,
    }
}

fn map_primitive(primitive: PrimitiveType) -> wgpu::PrimitiveTopology {
    match primitive {
        PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveType::Points => wgpu::PrimitiveTopology::PointList,
    }
}

fn map_index_format(index_type: IndexType) -> Option<wgpu::IndexFormat> {
    match index_type {
        IndexType::None => None,
        IndexType::Uint16 => Some(wgpu::IndexFormat::Uint16),
        IndexType::Uint32 => Some(wgpu::IndexFormat::Uint32),
    }
}
