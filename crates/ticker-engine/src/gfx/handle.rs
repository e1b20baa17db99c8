/// Opaque resource handles.
///
/// Ids start at 1; a handle is only meaningful for the backend that issued it.
macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub(crate) const KIND: &'static str = $kind;

            #[inline]
            pub(crate) const fn from_id(id: u32) -> Self {
                Self(id)
            }

            /// Raw id, stable for the lifetime of the backend.
            #[inline]
            pub const fn id(self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// GPU buffer (vertex or index data).
    BufferHandle,
    "buffer"
);
handle!(
    /// Compiled shader module plus its uniform block declarations.
    ShaderHandle,
    "shader"
);
handle!(
    /// Render pipeline.
    PipelineHandle,
    "pipeline"
);

/// Append-only resource storage keyed by 1-based ids.
///
/// Resources live until `clear()`, which the backends call on shutdown.
#[derive(Debug)]
pub(crate) struct Pool<T> {
    slots: Vec<T>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Pool<T> {
    pub(crate) fn insert(&mut self, value: T) -> u32 {
        self.slots.push(value);
        self.slots.len() as u32
    }

    pub(crate) fn get(&self, id: u32) -> Option<&T> {
        let index = (id as usize).checked_sub(1)?;
        self.slots.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let mut pool = Pool::default();
        assert_eq!(pool.insert("a"), 1);
        assert_eq!(pool.insert("b"), 2);
        assert_eq!(pool.get(1), Some(&"a"));
        assert_eq!(pool.get(2), Some(&"b"));
    }

    #[test]
    fn zero_and_out_of_range_ids_are_invalid() {
        let mut pool = Pool::default();
        pool.insert(7u8);
        assert!(pool.get(0).is_none());
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut pool = Pool::default();
        let id = pool.insert(1u8);
        pool.clear();
        assert!(pool.get(id).is_none());
        assert_eq!(pool.len(), 0);
    }
}
