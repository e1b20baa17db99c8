//! Core engine-facing contracts.
//!
//! Defines the interface between the host loop (`window::Runtime`, or a test)
//! and an exercise: the `App` callbacks, the per-frame context, and the
//! `Driver` that enforces the `init → frame* → cleanup` lifecycle.

mod app;
mod ctx;
mod driver;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use driver::{Driver, Phase};
