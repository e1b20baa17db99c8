use thiserror::Error;

/// Errors raised by the graphics capability layer.
///
/// Creation calls return these directly. In-pass calls (`apply_*`, `draw`) are
/// validated with the same type, but backends log and drop the call instead of
/// propagating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GfxError {
    #[error("graphics backend has been shut down")]
    ShutDown,

    #[error("invalid {kind} handle {id}")]
    InvalidHandle { kind: &'static str, id: u32 },

    #[error("buffer `{label}`: declared size is {declared} bytes but {actual} bytes were supplied")]
    SizeMismatch {
        label: String,
        declared: usize,
        actual: usize,
    },

    #[error("buffer `{label}` has no data")]
    EmptyBuffer { label: String },

    #[error("index buffer `{label}`: {len} bytes is not a whole number of indices")]
    PartialIndex { label: String, len: usize },

    #[error("invalid vertex layout: {0}")]
    Layout(String),

    #[error("shader `{label}`: {reason}")]
    Shader { label: String, reason: String },

    #[error("uniform block {slot}: expected {expected} bytes, got {actual}")]
    UniformSize {
        slot: usize,
        expected: usize,
        actual: usize,
    },

    #[error("pipeline has no uniform block in slot {0}")]
    UniformSlot(usize),

    #[error("uniform block {0} was not applied before draw")]
    MissingUniforms(usize),

    #[error("uniform ring buffer exhausted ({capacity} bytes per frame)")]
    UniformOverflow { capacity: usize },

    #[error("no render pass is active")]
    NoPass,

    #[error("a render pass is already active")]
    PassActive,

    #[error("no pipeline applied")]
    NoPipeline,

    #[error("no bindings applied")]
    NoBindings,

    #[error("pipeline expects a vertex buffer in slot {0}")]
    MissingVertexBuffer(usize),

    #[error("indexed pipeline has no index buffer bound")]
    MissingIndexBuffer,

    #[error("buffer {buffer}: offset {offset} is outside its {size} bytes")]
    BufferOffset { buffer: u32, offset: u64, size: u64 },

    #[error("index buffer of {size} bytes at offset {offset} does not hold whole {index_size}-byte indices")]
    IndexAlignment { size: u64, offset: u64, index_size: u64 },

    #[error("draw range {base} + {count} overflows")]
    DrawRange { base: u32, count: u32 },
}

pub(crate) fn label_or_unnamed(label: Option<&str>) -> String {
    label.unwrap_or("<unnamed>").to_string()
}
