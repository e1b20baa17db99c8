//! Vertex layout resolution.
//!
//! Turns the loose `VertexLayout` description (zero strides, zero offsets) into
//! concrete per-buffer strides and attribute offsets that a backend can hand to
//! the GPU API unchanged.

use super::desc::{
    BufferLayout, VertexFormat, VertexLayout, VertexStep, MAX_VERTEX_ATTRS, MAX_VERTEX_BUFFERS,
};
use super::error::GfxError;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResolvedAttr {
    pub location: u32,
    pub offset: u64,
    pub format: VertexFormat,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedBuffer {
    pub stride: u64,
    pub step: VertexStep,
    pub attrs: Vec<ResolvedAttr>,
}

/// Concrete layout; `buffers[i]` describes vertex buffer slot `i`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ResolvedLayout {
    pub buffers: Vec<ResolvedBuffer>,
}

impl ResolvedLayout {
    /// Number of vertex buffer slots a draw must bind.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

/// Resolves strides and offsets.
///
/// Rules:
/// - used buffer slots must be contiguous from 0
/// - if every attribute of a buffer has offset 0, offsets are packed in declaration order
/// - a zero stride becomes the end of the furthest attribute
/// - an explicit stride must cover every attribute
/// - only a step rate of 1 is supported
pub fn resolve(layout: &VertexLayout) -> Result<ResolvedLayout, GfxError> {
    if layout.attrs.len() > MAX_VERTEX_ATTRS {
        return Err(GfxError::Layout(format!(
            "{} attributes, at most {MAX_VERTEX_ATTRS} supported",
            layout.attrs.len()
        )));
    }

    if layout.buffers.len() > MAX_VERTEX_BUFFERS {
        return Err(GfxError::Layout(format!(
            "{} buffer layouts, at most {MAX_VERTEX_BUFFERS} supported",
            layout.buffers.len()
        )));
    }

    let mut slot_count = 0;
    for (location, attr) in layout.attrs.iter().enumerate() {
        if attr.buffer_index >= MAX_VERTEX_BUFFERS {
            return Err(GfxError::Layout(format!(
                "attribute {location} uses buffer slot {}, limit is {MAX_VERTEX_BUFFERS}",
                attr.buffer_index
            )));
        }
        slot_count = slot_count.max(attr.buffer_index + 1);
    }

    let mut buffers = Vec::with_capacity(slot_count);

    for slot in 0..slot_count {
        let buffer = layout.buffers.get(slot).copied().unwrap_or_default();

        if buffer.step_rate > 1 {
            return Err(GfxError::Layout(format!(
                "buffer slot {slot}: step rate {} is not supported",
                buffer.step_rate
            )));
        }

        let members: Vec<(u32, u64, VertexFormat)> = layout
            .attrs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.buffer_index == slot)
            .map(|(location, a)| (location as u32, a.offset, a.format))
            .collect();

        if members.is_empty() {
            return Err(GfxError::Layout(format!(
                "buffer slot {slot} has no attributes but a later slot does"
            )));
        }

        buffers.push(resolve_buffer(slot, buffer, &members)?);
    }

    Ok(ResolvedLayout { buffers })
}

fn resolve_buffer(
    slot: usize,
    buffer: BufferLayout,
    members: &[(u32, u64, VertexFormat)],
) -> Result<ResolvedBuffer, GfxError> {
    let packed = members.iter().all(|(_, offset, _)| *offset == 0);

    let mut attrs = Vec::with_capacity(members.len());
    let mut cursor = 0u64;
    for &(location, offset, format) in members {
        let offset = if packed { cursor } else { offset };
        cursor = offset + format.size();
        attrs.push(ResolvedAttr {
            location,
            offset,
            format,
        });
    }

    let extent = attrs
        .iter()
        .map(|a| a.offset + a.format.size())
        .max()
        .unwrap_or(0);

    let stride = if buffer.stride == 0 { extent } else { buffer.stride };
    if stride < extent {
        return Err(GfxError::Layout(format!(
            "buffer slot {slot}: stride {stride} is smaller than attribute extent {extent}"
        )));
    }

    Ok(ResolvedBuffer {
        stride,
        step: buffer.step,
        attrs,
    })
}
