//! Ticker engine crate.
//!
//! Owns the frame-loop driver, the immediate-style graphics interface with its
//! wgpu and recording backends, and the winit host that ties them to a window.

pub mod core;
pub mod device;
pub mod gfx;
pub mod input;
pub mod time;
pub mod window;

pub mod coords;
pub mod instancing;
pub mod logging;
