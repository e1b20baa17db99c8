//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - implementing the `gfx::Backend` interface on top of them

mod backend;
mod frame;
mod gpu;
mod init;
mod surface;

pub use backend::WgpuBackend;
pub use surface::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GfxDesc;
