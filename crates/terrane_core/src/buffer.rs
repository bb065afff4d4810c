//! # Chunk Buffer
//!
//! The mutable container a generation pipeline writes into.
//!
//! ## Layout
//!
//! Cells are stored densely as `[y][z][x]`, one [`MaterialId`] each.
//! A standard 16x16x256 chunk is 64 KiB of cells.
//!
//! ## Lifecycle
//!
//! A buffer is created per generation request, written only by the task
//! that owns it, and handed to the host once fully populated.

use crate::adapter::ChunkPatch;
use crate::coord::ChunkCoord;
use crate::dims::ChunkDimensions;
use crate::error::OutOfBoundsError;
use crate::material::MaterialId;

/// Dense terrain cells for one chunk.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkBuffer {
    /// Chunk position in the world.
    coord: ChunkCoord,
    /// Fixed dimensions.
    dims: ChunkDimensions,
    /// Cell data (indexed as [y][z][x]).
    cells: Box<[MaterialId]>,
}

impl ChunkBuffer {
    /// Allocates a buffer with every cell set to [`MaterialId::EMPTY`].
    #[must_use]
    pub fn new(coord: ChunkCoord, dims: ChunkDimensions) -> Self {
        Self {
            coord,
            dims,
            cells: vec![MaterialId::EMPTY; dims.cell_count()].into_boxed_slice(),
        }
    }

    /// Chunk coordinate this buffer belongs to.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Buffer dimensions.
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> ChunkDimensions {
        self.dims
    }

    /// Gets the material at local coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundsError`] outside `[0, width) x [0, height) x [0, depth)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Result<MaterialId, OutOfBoundsError> {
        let index = self.dims.index(x, y, z)?;
        Ok(self.cells[index])
    }

    /// Sets the material at local coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundsError`] outside `[0, width) x [0, height) x [0, depth)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, z: u32, material: MaterialId) -> Result<(), OutOfBoundsError> {
        let index = self.dims.index(x, y, z)?;
        self.cells[index] = material;
        Ok(())
    }

    /// Sets a cell if the signed local position is inside the chunk.
    ///
    /// Returns false (and writes nothing) when the position is clipped.
    #[inline]
    pub fn set_clipped(&mut self, x: i64, y: i64, z: i64, material: MaterialId) -> bool {
        if !self.dims.contains(x, y, z) {
            return false;
        }
        let index = (y as usize * self.dims.depth as usize + z as usize) * self.dims.width as usize
            + x as usize;
        self.cells[index] = material;
        true
    }

    /// Gets a cell by signed local position, `None` when outside the chunk.
    #[inline]
    #[must_use]
    pub fn get_clipped(&self, x: i64, y: i64, z: i64) -> Option<MaterialId> {
        if !self.dims.contains(x, y, z) {
            return None;
        }
        let index = (y as usize * self.dims.depth as usize + z as usize) * self.dims.width as usize
            + x as usize;
        Some(self.cells[index])
    }

    /// Highest non-empty cell of a column, `None` for an empty column.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundsError`] if the column is outside the chunk.
    pub fn surface_height(&self, x: u32, z: u32) -> Result<Option<u32>, OutOfBoundsError> {
        self.dims.index(x, 0, z)?;
        Ok((0..self.dims.height)
            .rev()
            .find(|&y| self.get_clipped(i64::from(x), i64::from(y), i64::from(z)).is_some_and(|m| !m.is_empty())))
    }

    /// Counts cells holding the given material.
    #[must_use]
    pub fn count(&self, material: MaterialId) -> usize {
        self.cells.iter().filter(|&&m| m == material).count()
    }

    /// Returns true if no cell has been written with a non-empty material.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|m| m.is_empty())
    }

    /// Applies a patch produced by deferred cross-chunk resolution.
    ///
    /// Returns the number of cells written. Writes are all-or-nothing:
    /// the patch is checked before any cell changes.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundsError`] for the first write outside the chunk.
    pub fn apply_patch(&mut self, patch: &ChunkPatch) -> Result<usize, OutOfBoundsError> {
        for write in &patch.writes {
            self.dims.index(write.x, write.y, write.z)?;
        }
        for write in &patch.writes {
            self.set(write.x, write.y, write.z, write.material)?;
        }
        Ok(patch.writes.len())
    }

    /// Raw cell slice in `[y][z][x]` order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[MaterialId] {
        &self.cells
    }

    /// Hand-off bytes: native-endian `u16` codes in `[y][z][x]` order.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Returns the raw data size in bytes.
    #[must_use]
    pub const fn data_size(dims: ChunkDimensions) -> usize {
        dims.cell_count() * std::mem::size_of::<MaterialId>()
    }
}

impl std::fmt::Debug for ChunkBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkBuffer")
            .field("coord", &self.coord)
            .field("dims", &self.dims)
            .field("non_empty", &(self.cells.len() - self.count(MaterialId::EMPTY)))
            .finish()
    }
}
