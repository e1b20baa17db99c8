//! Small value types shared by the engine and the exercises.
//!
//! Positions handed to the GPU are in normalized device coordinates
//! (-1..1, +Y up); there is no camera or viewport transform.

mod color;
mod vec2;

pub use color::ColorRgba;
pub use vec2::Vec2;
