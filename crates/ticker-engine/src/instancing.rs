//! Per-instance offset tables.
//!
//! The instancing exercise draws one small quad many times; each copy is moved
//! by an offset taken from a second, per-instance vertex buffer built here.

use thiserror::Error;

use crate::coords::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InstanceError {
    #[error("grid step must be positive, got {0}")]
    InvalidStep(i32),

    #[error("grid divisor must be finite and non-zero, got {0}")]
    InvalidDivisor(f32),

    #[error("instance table is full ({capacity} entries)")]
    Full { capacity: usize },
}

/// Bounded list of 2D instance offsets.
///
/// Capacity is fixed at construction; `push` past it fails instead of growing.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceTable {
    offsets: Vec<Vec2>,
    capacity: usize,
}

impl InstanceTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, offset: Vec2) -> Result<(), InstanceError> {
        if self.offsets.len() >= self.capacity {
            return Err(InstanceError::Full {
                capacity: self.capacity,
            });
        }
        self.offsets.push(offset);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instance count as passed to `draw`.
    pub fn instance_count(&self) -> u32 {
        u32::try_from(self.offsets.len()).unwrap_or(u32::MAX)
    }

    /// Offsets in upload order; `Vec2` is `Pod`, so this casts straight to bytes.
    pub fn as_slice(&self) -> &[Vec2] {
        &self.offsets
    }
}

/// Square grid of instance offsets.
///
/// Rows (`y`) are the outer loop and columns (`x`) the inner one, both over
/// `start..end` by `step`. Each cell maps to `(x / divisor + offset, y / divisor + offset)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceGrid {
    pub start: i32,
    pub end: i32,
    pub step: i32,
    pub divisor: f32,
    pub offset: f32,
}

impl Default for InstanceGrid {
    /// 10 × 10 cells covering roughly `[-0.9, 0.9]` in clip space.
    fn default() -> Self {
        Self {
            start: -10,
            end: 10,
            step: 2,
            divisor: 10.0,
            offset: 0.1,
        }
    }
}

impl InstanceGrid {
    /// Cells along one axis. Zero for an empty range or a non-positive step.
    pub fn cells_per_axis(&self) -> usize {
        if self.step <= 0 || self.end <= self.start {
            return 0;
        }
        let span = (self.end as i64 - self.start as i64) as usize;
        span.div_ceil(self.step as usize)
    }

    pub fn count(&self) -> usize {
        let n = self.cells_per_axis();
        n * n
    }

    pub fn generate(&self) -> Result<InstanceTable, InstanceError> {
        if self.step <= 0 {
            return Err(InstanceError::InvalidStep(self.step));
        }
        if self.divisor == 0.0 || !self.divisor.is_finite() {
            return Err(InstanceError::InvalidDivisor(self.divisor));
        }

        let mut table = InstanceTable::with_capacity(self.count());
        for y in self.axis() {
            for x in self.axis() {
                table.push(Vec2::new(
                    x as f32 / self.divisor + self.offset,
                    y as f32 / self.divisor + self.offset,
                ))?;
            }
        }

        log::debug!("instance grid: {} offsets", table.len());
        Ok(table)
    }

    fn axis(&self) -> impl Iterator<Item = i32> {
        (self.start..self.end).step_by(self.step.max(1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 1e-6 && (a.y - y).abs() < 1e-6
    }

    #[test]
    fn default_grid_has_100_instances() {
        let grid = InstanceGrid::default();
        assert_eq!(grid.cells_per_axis(), 10);
        assert_eq!(grid.count(), 100);

        let table = grid.generate().unwrap();
        assert_eq!(table.len(), 100);
        assert_eq!(table.instance_count(), 100);
    }

    #[test]
    fn offsets_are_row_major_scaled_and_shifted() {
        let table = InstanceGrid::default().generate().unwrap();
        let offsets = table.as_slice();

        assert!(close(offsets[0], -0.9, -0.9));
        assert!(close(offsets[1], -0.7, -0.9));
        assert!(close(offsets[9], 0.9, -0.9));
        assert!(close(offsets[10], -0.9, -0.7));
        assert!(close(offsets[99], 0.9, 0.9));
    }

    #[test]
    fn uneven_range_rounds_up() {
        let grid = InstanceGrid {
            start: 0,
            end: 5,
            step: 2,
            ..InstanceGrid::default()
        };
        assert_eq!(grid.cells_per_axis(), 3);
        assert_eq!(grid.generate().unwrap().len(), 9);
    }

    #[test]
    fn empty_range_yields_no_instances() {
        let grid = InstanceGrid {
            start: 3,
            end: 3,
            ..InstanceGrid::default()
        };
        let table = grid.generate().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn non_positive_step_is_rejected() {
        for step in [0, -2] {
            let grid = InstanceGrid {
                step,
                ..InstanceGrid::default()
            };
            assert_eq!(grid.count(), 0);
            assert_eq!(grid.generate(), Err(InstanceError::InvalidStep(step)));
        }
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let grid = InstanceGrid {
            divisor: 0.0,
            ..InstanceGrid::default()
        };
        assert!(matches!(grid.generate(), Err(InstanceError::InvalidDivisor(_))));
    }

    #[test]
    fn push_past_capacity_fails() {
        let mut table = InstanceTable::with_capacity(1);
        table.push(Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(
            table.push(Vec2::new(1.0, 1.0)),
            Err(InstanceError::Full { capacity: 1 })
        );
        assert_eq!(table.len(), 1);
    }
}
