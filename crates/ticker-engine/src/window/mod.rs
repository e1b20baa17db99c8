//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, builds the GPU backend for the window,
//! and forwards platform callbacks to a `core::Driver`.

mod runtime;

pub use runtime::{AppDesc, Runtime};
