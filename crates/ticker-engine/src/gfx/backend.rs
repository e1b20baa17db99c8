use super::desc::{BackendKind, Bindings, BufferDesc, PassAction, PipelineDesc, ShaderDesc};
use super::error::GfxError;
use super::handle::{BufferHandle, PipelineHandle, ShaderHandle};

/// Immediate-style graphics capability interface.
///
/// Resource creation is fallible and meant for `init`. Per-frame calls follow
/// `begin_pass → apply_pipeline → apply_bindings → [apply_uniforms] → draw… →
/// end_pass → commit`; they never fail at the call site. Invalid per-frame calls
/// are logged and dropped.
///
/// After `shutdown` every call is a no-op and creation returns
/// [`GfxError::ShutDown`].
pub trait Backend {
    fn backend_kind(&self) -> BackendKind;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GfxError>;

    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GfxError>;

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, GfxError>;

    fn begin_pass(&mut self, action: &PassAction);

    fn apply_pipeline(&mut self, pipeline: PipelineHandle);

    fn apply_bindings(&mut self, bindings: &Bindings);

    /// Uploads the uniform block for `slot` of the applied pipeline's shader.
    fn apply_uniforms(&mut self, slot: usize, data: &[u8]);

    /// Draws `num_elements` vertices (or indices, for indexed pipelines)
    /// starting at `base_element`, `num_instances` times.
    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32);

    fn end_pass(&mut self);

    /// Submits the frame's work for presentation.
    fn commit(&mut self);

    /// Whether the device or surface failed in a way rendering cannot recover from.
    fn is_lost(&self) -> bool {
        false
    }

    /// Releases every resource. Idempotent.
    fn shutdown(&mut self);

    fn is_shut_down(&self) -> bool;
}
