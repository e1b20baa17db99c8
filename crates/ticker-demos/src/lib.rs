//! The ticker exercises.
//!
//! Each module is one self-contained exercise: an `init` that builds its GPU
//! resources against a [`Backend`](ticker_engine::gfx::Backend), an
//! [`App`](ticker_engine::core::App) impl that draws one pass per frame, and an
//! `app_desc` with its window title. The binaries under `src/bin/` only wire
//! these into `Runtime::run`.

pub mod attributes;
pub mod clear;
pub mod instancing;
pub mod ohlc;
pub mod quad;
pub mod triangle;
pub mod uniforms;
