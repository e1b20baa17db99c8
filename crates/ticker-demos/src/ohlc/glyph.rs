//! OHLC bar geometry.
//!
//! Each bar becomes three line segments: the high-low wick, the open tick to
//! the left of the wick and the close tick to the right. Bars that closed at or
//! above their open are green, the rest red.

use anyhow::{ensure, Result};
use bytemuck::{Pod, Zeroable};

pub const UP_COLOR: [f32; 3] = [0.2, 0.8, 0.3];
pub const DOWN_COLOR: [f32; 3] = [0.9, 0.25, 0.2];

/// Vertices emitted per bar (three segments).
pub const VERTICES_PER_BAR: usize = 6;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bar {
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
}

impl Bar {
    pub const fn new(open: f32, high: f32, low: f32, close: f32) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    /// Finite prices with `low <= open, close <= high`.
    pub fn is_valid(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite());
        finite
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

/// Region of clip space the chart occupies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChartArea {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    /// Tick length as a fraction of one bar's horizontal slot.
    pub tick: f32,
}

impl Default for ChartArea {
    fn default() -> Self {
        Self {
            left: -0.9,
            right: 0.9,
            bottom: -0.8,
            top: 0.8,
            tick: 0.3,
        }
    }
}

impl ChartArea {
    fn slot_width(&self, bars: usize) -> f32 {
        (self.right - self.left) / bars as f32
    }
}

/// Maps prices onto the chart's vertical extent.
#[derive(Debug, Copy, Clone)]
struct PriceScale {
    low: f32,
    high: f32,
    bottom: f32,
    top: f32,
}

impl PriceScale {
    fn new(bars: &[Bar], area: &ChartArea) -> Self {
        let low = bars.iter().map(|b| b.low).fold(f32::INFINITY, f32::min);
        let high = bars.iter().map(|b| b.high).fold(f32::NEG_INFINITY, f32::max);
        Self {
            low,
            high,
            bottom: area.bottom,
            top: area.top,
        }
    }

    fn y(&self, price: f32) -> f32 {
        let range = self.high - self.low;
        if range <= f32::EPSILON {
            return (self.bottom + self.top) * 0.5;
        }
        self.bottom + (price - self.low) / range * (self.top - self.bottom)
    }
}

/// Builds a line list for `bars`, left to right.
pub fn glyph_vertices(bars: &[Bar], area: &ChartArea) -> Result<Vec<LineVertex>> {
    ensure!(!bars.is_empty(), "no bars to draw");
    ensure!(
        area.right > area.left && area.top > area.bottom,
        "chart area {area:?} is empty"
    );
    if let Some(i) = bars.iter().position(|b| !b.is_valid()) {
        anyhow::bail!("bar {i} is not a valid OHLC bar: {:?}", bars[i]);
    }

    let scale = PriceScale::new(bars, area);
    let slot = area.slot_width(bars.len());
    let tick = slot * area.tick;

    let mut out = Vec::with_capacity(bars.len() * VERTICES_PER_BAR);
    for (i, bar) in bars.iter().enumerate() {
        let color = if bar.is_up() { UP_COLOR } else { DOWN_COLOR };
        let x = area.left + (i as f32 + 0.5) * slot;
        let v = |x: f32, price: f32| LineVertex {
            position: [x, scale.y(price)],
            color,
        };

        out.extend([
            v(x, bar.low),
            v(x, bar.high),
            v(x - tick, bar.open),
            v(x, bar.open),
            v(x, bar.close),
            v(x + tick, bar.close),
        ]);
    }
    Ok(out)
}
