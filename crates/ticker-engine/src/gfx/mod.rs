//! Immediate-style graphics interface.
//!
//! Exercises talk to the GPU only through [`Backend`]:
//! - descriptors (`BufferDesc`, `ShaderDesc`, `PipelineDesc`) describe immutable resources
//! - handles refer to resources owned by the backend
//! - pass calls record one render pass at a time
//!
//! Two implementations exist: `device::WgpuBackend` for real windows and
//! [`Recorder`] for headless runs.

mod backend;
mod desc;
mod error;
mod handle;
mod layout;
mod pass;
mod recorder;

pub use backend::Backend;
pub use desc::{
    BackendKind, Bindings, BufferDesc, BufferLayout, BufferUsage, IndexType, LoadAction,
    PassAction, PipelineDesc, PrimitiveType, ShaderDesc, ShaderStage, UniformBlockDesc,
    VertexAttr, VertexFormat, VertexLayout, VertexStep, DEFAULT_CLEAR_COLOR, MAX_UNIFORM_BLOCKS,
    MAX_VERTEX_ATTRS, MAX_VERTEX_BUFFERS,
};
pub use error::GfxError;
pub use handle::{BufferHandle, PipelineHandle, ShaderHandle};
pub use layout::{resolve as resolve_layout, ResolvedAttr, ResolvedBuffer, ResolvedLayout};
pub use recorder::{Call, Recorder};

pub(crate) use handle::Pool;
pub(crate) use pass::{PassState, PipelineInfo};
