use bytemuck::Pod;

use crate::coords::ColorRgba;

use super::error::{label_or_unnamed, GfxError};
use super::handle::{BufferHandle, ShaderHandle};

pub const MAX_VERTEX_BUFFERS: usize = 8;
pub const MAX_VERTEX_ATTRS: usize = 16;
pub const MAX_UNIFORM_BLOCKS: usize = 4;

/// Clear color used by every exercise.
pub const DEFAULT_CLEAR_COLOR: ColorRgba = ColorRgba::new(0.2, 0.3, 0.3, 1.0);

/// Graphics API the backend runs on.
///
/// Shader descriptors are requested per backend kind so exercises can select
/// matching sources.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BackendKind {
    Vulkan,
    Metal,
    Dx12,
    Gl,
    WebGpu,
    /// No GPU: the recording backend used by tests.
    Headless,
}

// ── buffers ───────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// Immutable buffer contents uploaded at creation.
#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: Option<&'a str>,
    pub usage: BufferUsage,
    /// Declared byte size. When set it must equal `data.len()`.
    pub size: Option<usize>,
    pub data: &'a [u8],
}

impl<'a> BufferDesc<'a> {
    pub fn vertices<T: Pod>(label: &'a str, data: &'a [T]) -> Self {
        Self {
            label: Some(label),
            usage: BufferUsage::Vertex,
            size: None,
            data: bytemuck::cast_slice(data),
        }
    }

    pub fn indices<T: Pod>(label: &'a str, data: &'a [T]) -> Self {
        Self {
            label: Some(label),
            usage: BufferUsage::Index,
            size: None,
            data: bytemuck::cast_slice(data),
        }
    }

    /// Declares the expected byte size; creation fails if the data disagrees.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn validate(&self) -> Result<(), GfxError> {
        if self.data.is_empty() {
            return Err(GfxError::EmptyBuffer {
                label: label_or_unnamed(self.label),
            });
        }

        if let Some(declared) = self.size {
            if declared != self.data.len() {
                return Err(GfxError::SizeMismatch {
                    label: label_or_unnamed(self.label),
                    declared,
                    actual: self.data.len(),
                });
            }
        }

        if self.usage == BufferUsage::Index && self.data.len() % IndexType::Uint16.size() != 0 {
            return Err(GfxError::PartialIndex {
                label: label_or_unnamed(self.label),
                len: self.data.len(),
            });
        }

        Ok(())
    }
}

// ── shaders ───────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// One uniform block, bound at `@group(0) @binding(slot)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformBlockDesc {
    pub stage: ShaderStage,
    /// Block size in bytes, a multiple of 16.
    pub size: usize,
}

/// WGSL module with entry points and uniform block layout.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    pub label: Option<&'a str>,
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub uniform_blocks: &'a [UniformBlockDesc],
}

impl<'a> ShaderDesc<'a> {
    /// Shader with `vs_main`/`fs_main` entry points and no uniforms.
    pub fn wgsl(label: &'a str, source: &'a str) -> Self {
        Self {
            label: Some(label),
            source,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            uniform_blocks: &[],
        }
    }

    pub fn with_uniforms(mut self, blocks: &'a [UniformBlockDesc]) -> Self {
        self.uniform_blocks = blocks;
        self
    }

    pub fn validate(&self) -> Result<(), GfxError> {
        let fail = |reason: String| GfxError::Shader {
            label: label_or_unnamed(self.label),
            reason,
        };

        if self.source.trim().is_empty() {
            return Err(fail("empty source".into()));
        }
        if self.vertex_entry.is_empty() || self.fragment_entry.is_empty() {
            return Err(fail("missing entry point name".into()));
        }
        if self.uniform_blocks.len() > MAX_UNIFORM_BLOCKS {
            return Err(fail(format!(
                "{} uniform blocks, at most {MAX_UNIFORM_BLOCKS} supported",
                self.uniform_blocks.len()
            )));
        }
        for (slot, block) in self.uniform_blocks.iter().enumerate() {
            if block.size == 0 || block.size % 16 != 0 {
                return Err(fail(format!(
                    "uniform block {slot} size {} is not a non-zero multiple of 16",
                    block.size
                )));
            }
        }
        Ok(())
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float,
    Float2,
    Float3,
    Float4,
    UByte4N,
    Uint,
}

impl VertexFormat {
    /// Size in bytes.
    pub const fn size(self) -> u64 {
        match self {
            VertexFormat::Float | VertexFormat::UByte4N | VertexFormat::Uint => 4,
            VertexFormat::Float2 => 8,
            VertexFormat::Float3 => 12,
            VertexFormat::Float4 => 16,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum VertexStep {
    #[default]
    PerVertex,
    PerInstance,
}

/// Layout of one vertex buffer slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferLayout {
    /// Bytes between elements; 0 derives it from the attributes.
    pub stride: u64,
    pub step: VertexStep,
    pub step_rate: u32,
}

impl Default for BufferLayout {
    fn default() -> Self {
        Self {
            stride: 0,
            step: VertexStep::PerVertex,
            step_rate: 1,
        }
    }
}

impl BufferLayout {
    pub const fn per_instance() -> Self {
        Self {
            stride: 0,
            step: VertexStep::PerInstance,
            step_rate: 1,
        }
    }
}

/// One vertex attribute; its index in `VertexLayout::attrs` is the shader location.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttr {
    pub buffer_index: usize,
    /// Byte offset inside the element; all-zero offsets in a buffer are packed.
    pub offset: u64,
    pub format: VertexFormat,
}

impl VertexAttr {
    pub const fn new(format: VertexFormat) -> Self {
        Self {
            buffer_index: 0,
            offset: 0,
            format,
        }
    }

    pub const fn in_buffer(mut self, buffer_index: usize) -> Self {
        self.buffer_index = buffer_index;
        self
    }

    pub const fn at(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexLayout {
    /// Per-slot layouts; slots past the end use `BufferLayout::default()`.
    pub buffers: Vec<BufferLayout>,
    pub attrs: Vec<VertexAttr>,
}

impl VertexLayout {
    /// Single interleaved per-vertex buffer.
    pub fn interleaved(attrs: &[VertexFormat]) -> Self {
        Self {
            buffers: Vec::new(),
            attrs: attrs.iter().map(|f| VertexAttr::new(*f)).collect(),
        }
    }
}

// ── pipelines ─────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PrimitiveType {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum IndexType {
    #[default]
    None,
    Uint16,
    Uint32,
}

impl IndexType {
    pub const fn size(self) -> usize {
        match self {
            IndexType::None => 0,
            IndexType::Uint16 => 2,
            IndexType::Uint32 => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: Option<&'a str>,
    pub shader: ShaderHandle,
    pub layout: VertexLayout,
    pub primitive: PrimitiveType,
    pub index_type: IndexType,
}

impl<'a> PipelineDesc<'a> {
    pub fn new(label: &'a str, shader: ShaderHandle, layout: VertexLayout) -> Self {
        Self {
            label: Some(label),
            shader,
            layout,
            primitive: PrimitiveType::Triangles,
            index_type: IndexType::None,
        }
    }

    pub fn primitive(mut self, primitive: PrimitiveType) -> Self {
        self.primitive = primitive;
        self
    }

    pub fn indexed(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }
}

// ── passes ────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LoadAction {
    Clear(ColorRgba),
    Load,
}

/// What happens to the color attachment when a pass begins.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PassAction {
    pub color: LoadAction,
}

impl PassAction {
    pub const fn clear(color: ColorRgba) -> Self {
        Self {
            color: LoadAction::Clear(color),
        }
    }

    pub const fn load() -> Self {
        Self {
            color: LoadAction::Load,
        }
    }
}

impl Default for PassAction {
    fn default() -> Self {
        Self::clear(DEFAULT_CLEAR_COLOR)
    }
}

/// Buffers bound for the next draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    pub vertex_buffers: [Option<BufferHandle>; MAX_VERTEX_BUFFERS],
    pub vertex_buffer_offsets: [u64; MAX_VERTEX_BUFFERS],
    pub index_buffer: Option<BufferHandle>,
    pub index_buffer_offset: u64,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `buffer` to vertex slot `slot`. Slots beyond the limit are ignored.
    pub fn vertex(mut self, slot: usize, buffer: BufferHandle) -> Self {
        if let Some(entry) = self.vertex_buffers.get_mut(slot) {
            *entry = Some(buffer);
        }
        self
    }

    pub fn index(mut self, buffer: BufferHandle) -> Self {
        self.index_buffer = Some(buffer);
        self
    }

    /// Iterates `(slot, handle, offset)` for bound vertex buffers.
    pub fn bound_vertex_buffers(&self) -> impl Iterator<Item = (usize, BufferHandle, u64)> + '_ {
        self.vertex_buffers
            .iter()
            .enumerate()
            .filter_map(|(slot, h)| h.map(|h| (slot, h, self.vertex_buffer_offsets[slot])))
    }
}
