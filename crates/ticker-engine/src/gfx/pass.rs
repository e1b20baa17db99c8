use super::desc::{Bindings, IndexType, PipelineDesc, MAX_UNIFORM_BLOCKS};
use super::error::GfxError;
use super::handle::{BufferHandle, PipelineHandle};
use super::layout::{self, ResolvedLayout};

/// Backend-independent facts about a pipeline, used to validate draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PipelineInfo {
    pub index_type: IndexType,
    pub buffer_count: usize,
    pub uniform_sizes: Vec<usize>,
}

impl PipelineInfo {
    pub(crate) fn new(
        desc: &PipelineDesc<'_>,
        uniform_sizes: Vec<usize>,
    ) -> Result<(Self, ResolvedLayout), GfxError> {
        let resolved = layout::resolve(&desc.layout)?;
        let info = Self {
            index_type: desc.index_type,
            buffer_count: resolved.buffer_count(),
            uniform_sizes,
        };
        Ok((info, resolved))
    }
}

/// Tracks what has been applied inside the current pass.
///
/// Both backends run every in-pass call through this before touching their
/// own state, so the recorder rejects exactly what the GPU backend would.
#[derive(Debug, Default)]
pub(crate) struct PassState {
    active: bool,
    pipeline: Option<(PipelineHandle, PipelineInfo)>,
    bindings: Option<Bindings>,
    uniforms_applied: [bool; MAX_UNIFORM_BLOCKS],
}

impl PassState {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn pipeline(&self) -> Option<(PipelineHandle, &PipelineInfo)> {
        self.pipeline.as_ref().map(|(h, info)| (*h, info))
    }

    pub(crate) fn begin(&mut self) -> Result<(), GfxError> {
        if self.active {
            return Err(GfxError::PassActive);
        }
        *self = Self {
            active: true,
            ..Self::default()
        };
        Ok(())
    }

    pub(crate) fn apply_pipeline(
        &mut self,
        handle: PipelineHandle,
        info: PipelineInfo,
    ) -> Result<(), GfxError> {
        if !self.active {
            return Err(GfxError::NoPass);
        }
        self.pipeline = Some((handle, info));
        self.bindings = None;
        self.uniforms_applied = [false; MAX_UNIFORM_BLOCKS];
        Ok(())
    }

    /// Validates `bindings` against the applied pipeline.
    ///
    /// `buffer_size` returns the byte size of a live buffer, `None` for a stale
    /// handle. Every bound offset must fall inside its buffer, and an indexed
    /// pipeline's index buffer must hold whole indices from its offset on.
    pub(crate) fn apply_bindings(
        &mut self,
        bindings: &Bindings,
        buffer_size: impl Fn(BufferHandle) -> Option<u64>,
    ) -> Result<(), GfxError> {
        let info = self.current()?;

        let size_of = |h: BufferHandle| {
            buffer_size(h).ok_or(GfxError::InvalidHandle {
                kind: BufferHandle::KIND,
                id: h.id(),
            })
        };
        let check_offset = |h: BufferHandle, offset: u64| {
            let size = size_of(h)?;
            if offset >= size {
                return Err(GfxError::BufferOffset {
                    buffer: h.id(),
                    offset,
                    size,
                });
            }
            Ok(size)
        };

        for (_, handle, offset) in bindings.bound_vertex_buffers() {
            check_offset(handle, offset)?;
        }
        for slot in 0..info.buffer_count {
            if bindings.vertex_buffers[slot].is_none() {
                return Err(GfxError::MissingVertexBuffer(slot));
            }
        }

        if let Some(handle) = bindings.index_buffer {
            let offset = bindings.index_buffer_offset;
            let size = check_offset(handle, offset)?;
            let index_size = info.index_type.size() as u64;
            if index_size > 0 && (size % index_size != 0 || offset % index_size != 0) {
                return Err(GfxError::IndexAlignment {
                    size,
                    offset,
                    index_size,
                });
            }
        } else if info.index_type != IndexType::None {
            return Err(GfxError::MissingIndexBuffer);
        }

        self.bindings = Some(bindings.clone());
        Ok(())
    }

    /// Validates a uniform block for `slot`, then runs `upload`.
    ///
    /// The slot counts as applied only when `upload` succeeds; a failed upload
    /// leaves it unapplied so the next draw is dropped.
    pub(crate) fn apply_uniforms(
        &mut self,
        slot: usize,
        len: usize,
        upload: impl FnOnce() -> Result<(), GfxError>,
    ) -> Result<(), GfxError> {
        let info = self.current()?;
        let expected = *info
            .uniform_sizes
            .get(slot)
            .ok_or(GfxError::UniformSlot(slot))?;

        if expected != len {
            return Err(GfxError::UniformSize {
                slot,
                expected,
                actual: len,
            });
        }

        if let Err(e) = upload() {
            self.uniforms_applied[slot] = false;
            return Err(e);
        }
        self.uniforms_applied[slot] = true;
        Ok(())
    }

    /// Validates a draw of `count` elements from `base` and returns the
    /// pipeline it will use.
    pub(crate) fn check_draw(
        &self,
        base: u32,
        count: u32,
    ) -> Result<(PipelineHandle, &PipelineInfo), GfxError> {
        if !self.active {
            return Err(GfxError::NoPass);
        }
        let (handle, info) = self.pipeline.as_ref().ok_or(GfxError::NoPipeline)?;

        let needs_bindings = info.buffer_count > 0 || info.index_type != IndexType::None;
        if needs_bindings && self.bindings.is_none() {
            return Err(GfxError::NoBindings);
        }

        if let Some(slot) = (0..info.uniform_sizes.len()).find(|s| !self.uniforms_applied[*s]) {
            return Err(GfxError::MissingUniforms(slot));
        }

        if base.checked_add(count).is_none() {
            return Err(GfxError::DrawRange { base, count });
        }

        Ok((*handle, info))
    }

    pub(crate) fn end(&mut self) -> Result<(), GfxError> {
        if !self.active {
            return Err(GfxError::NoPass);
        }
        *self = Self::default();
        Ok(())
    }

    fn current(&self) -> Result<&PipelineInfo, GfxError> {
        if !self.active {
            return Err(GfxError::NoPass);
        }
        self.pipeline
            .as_ref()
            .map(|(_, info)| info)
            .ok_or(GfxError::NoPipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(buffers: usize, index_type: IndexType, uniforms: Vec<usize>) -> PipelineInfo {
        PipelineInfo {
            index_type,
            buffer_count: buffers,
            uniform_sizes: uniforms,
        }
    }

    fn pip() -> PipelineHandle {
        PipelineHandle::from_id(1)
    }

    /// Every buffer id is live and 36 bytes long.
    fn sized(_: BufferHandle) -> Option<u64> {
        Some(36)
    }

    #[test]
    fn draw_outside_pass_is_rejected() {
        let state = PassState::default();
        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::NoPass);
    }

    #[test]
    fn nested_begin_is_rejected() {
        let mut state = PassState::default();
        state.begin().unwrap();
        assert_eq!(state.begin(), Err(GfxError::PassActive));
    }

    #[test]
    fn draw_needs_pipeline_and_bindings() {
        let mut state = PassState::default();
        state.begin().unwrap();
        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::NoPipeline);

        state.apply_pipeline(pip(), info(1, IndexType::None, vec![])).unwrap();
        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::NoBindings);

        let b = Bindings::new().vertex(0, BufferHandle::from_id(1));
        state.apply_bindings(&b, sized).unwrap();
        assert!(state.check_draw(0, 3).is_ok());
    }

    #[test]
    fn missing_instance_buffer_is_reported_by_slot() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(2, IndexType::None, vec![])).unwrap();

        let b = Bindings::new().vertex(0, BufferHandle::from_id(1));
        assert_eq!(state.apply_bindings(&b, sized), Err(GfxError::MissingVertexBuffer(1)));
    }

    #[test]
    fn indexed_pipeline_requires_index_buffer() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(1, IndexType::Uint16, vec![])).unwrap();

        let b = Bindings::new().vertex(0, BufferHandle::from_id(1));
        assert_eq!(state.apply_bindings(&b, sized), Err(GfxError::MissingIndexBuffer));
    }

    #[test]
    fn uniforms_are_checked_by_slot_and_size() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(0, IndexType::None, vec![16])).unwrap();

        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::MissingUniforms(0));
        assert_eq!(state.apply_uniforms(1, 16, || Ok(())), Err(GfxError::UniformSlot(1)));
        assert_eq!(
            state.apply_uniforms(0, 8, || Ok(())),
            Err(GfxError::UniformSize {
                slot: 0,
                expected: 16,
                actual: 8
            })
        );

        state.apply_uniforms(0, 16, || Ok(())).unwrap();
        assert!(state.check_draw(0, 3).is_ok());
    }

    #[test]
    fn end_resets_state() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(0, IndexType::None, vec![])).unwrap();
        state.end().unwrap();

        assert!(!state.is_active());
        assert_eq!(state.end(), Err(GfxError::NoPass));
    }

    #[test]
    fn offsets_must_fall_inside_the_buffer() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(1, IndexType::None, vec![])).unwrap();

        let mut b = Bindings::new().vertex(0, BufferHandle::from_id(1));
        b.vertex_buffer_offsets[0] = 4096;
        assert_eq!(
            state.apply_bindings(&b, sized),
            Err(GfxError::BufferOffset {
                buffer: 1,
                offset: 4096,
                size: 36
            })
        );

        b.vertex_buffer_offsets[0] = 36;
        assert!(matches!(
            state.apply_bindings(&b, sized),
            Err(GfxError::BufferOffset { offset: 36, .. })
        ));
        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::NoBindings);

        b.vertex_buffer_offsets[0] = 12;
        assert!(state.apply_bindings(&b, sized).is_ok());
    }

    #[test]
    fn index_offset_is_checked_too() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(1, IndexType::Uint16, vec![])).unwrap();

        let mut b = Bindings::new()
            .vertex(0, BufferHandle::from_id(1))
            .index(BufferHandle::from_id(2));
        b.index_buffer_offset = 40;
        assert!(matches!(
            state.apply_bindings(&b, sized),
            Err(GfxError::BufferOffset { buffer: 2, .. })
        ));
    }

    #[test]
    fn index_buffer_must_hold_whole_indices_of_the_pipeline_type() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(1, IndexType::Uint32, vec![])).unwrap();

        let six_bytes = |h: BufferHandle| Some(if h.id() == 2 { 6 } else { 36 });
        let b = Bindings::new()
            .vertex(0, BufferHandle::from_id(1))
            .index(BufferHandle::from_id(2));
        assert_eq!(
            state.apply_bindings(&b, six_bytes),
            Err(GfxError::IndexAlignment {
                size: 6,
                offset: 0,
                index_size: 4
            })
        );

        let mut b = b;
        b.index_buffer = Some(BufferHandle::from_id(3));
        b.index_buffer_offset = 2;
        assert!(matches!(
            state.apply_bindings(&b, sized),
            Err(GfxError::IndexAlignment { offset: 2, .. })
        ));

        b.index_buffer_offset = 4;
        assert!(state.apply_bindings(&b, sized).is_ok());
    }

    #[test]
    fn stale_handle_is_reported_before_binding() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(1, IndexType::None, vec![])).unwrap();

        let b = Bindings::new().vertex(0, BufferHandle::from_id(7));
        assert_eq!(
            state.apply_bindings(&b, |_| None),
            Err(GfxError::InvalidHandle {
                kind: "buffer",
                id: 7
            })
        );
    }

    #[test]
    fn failed_upload_leaves_uniforms_unapplied() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(0, IndexType::None, vec![16])).unwrap();

        let full = || Err(GfxError::UniformOverflow { capacity: 16 });
        assert_eq!(
            state.apply_uniforms(0, 16, full),
            Err(GfxError::UniformOverflow { capacity: 16 })
        );
        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::MissingUniforms(0));

        state.apply_uniforms(0, 16, || Ok(())).unwrap();
        assert!(state.check_draw(0, 3).is_ok());

        // A later failure withdraws the earlier block as well.
        state.apply_uniforms(0, 16, full).unwrap_err();
        assert_eq!(state.check_draw(0, 3).unwrap_err(), GfxError::MissingUniforms(0));
    }

    #[test]
    fn overflowing_draw_range_is_rejected() {
        let mut state = PassState::default();
        state.begin().unwrap();
        state.apply_pipeline(pip(), info(0, IndexType::None, vec![])).unwrap();

        assert_eq!(
            state.check_draw(u32::MAX, 1).unwrap_err(),
            GfxError::DrawRange {
                base: u32::MAX,
                count: 1
            }
        );
        assert!(state.check_draw(u32::MAX - 3, 3).is_ok());
    }
}
