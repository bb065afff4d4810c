//! # Chunk Coordinates
//!
//! Chunks are addressed by an integer pair in chunk-grid units.
//! World block positions use `i64` so that `coord * width` never overflows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dims::ChunkDimensions;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world block coordinates to the owning chunk coordinate.
    #[inline]
    #[must_use]
    pub fn from_block_pos(block_x: i64, block_z: i64, dims: ChunkDimensions) -> Self {
        Self {
            x: block_x.div_euclid(i64::from(dims.width)) as i32,
            z: block_z.div_euclid(i64::from(dims.depth)) as i32,
        }
    }

    /// World X coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub fn origin_x(self, dims: ChunkDimensions) -> i64 {
        i64::from(self.x) * i64::from(dims.width)
    }

    /// World Z coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub fn origin_z(self, dims: ChunkDimensions) -> i64 {
        i64::from(self.z) * i64::from(dims.depth)
    }

    /// Returns the adjacent chunk in the given direction.
    ///
    /// Wraps at the edge of the `i32` grid instead of overflowing.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let (dx, dz) = direction.offset();
        Self {
            x: self.x.wrapping_add(dx),
            z: self.z.wrapping_add(dz),
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Horizontal direction between adjacent chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards +X.
    East,
    /// Towards +Z.
    South,
    /// Towards -X.
    West,
    /// Towards -Z.
    North,
}

impl Direction {
    /// All directions, in tie-break order.
    pub const ALL: [Self; 4] = [Self::East, Self::South, Self::West, Self::North];

    /// Chunk-grid offset `(dx, dz)` of this direction.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::North => (0, -1),
        }
    }

    /// The opposite direction.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::North => Self::South,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_from_block() {
        let dims = ChunkDimensions::STANDARD;
        assert_eq!(ChunkCoord::from_block_pos(0, 0, dims), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block_pos(15, 15, dims), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block_pos(16, 16, dims), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::from_block_pos(-1, -1, dims), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block_pos(-16, -16, dims), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block_pos(-17, -17, dims), ChunkCoord::new(-2, -2));
    }

    #[test]
    fn test_origin_does_not_overflow() {
        let dims = ChunkDimensions::STANDARD;
        let coord = ChunkCoord::new(i32::MAX, i32::MIN);
        assert_eq!(coord.origin_x(dims), i64::from(i32::MAX) * 16);
        assert_eq!(coord.origin_z(dims), i64::from(i32::MIN) * 16);
    }

    #[test]
    fn test_neighbors() {
        let c = ChunkCoord::new(5, 5);
        assert_eq!(c.neighbor(Direction::East), ChunkCoord::new(6, 5));
        assert_eq!(c.neighbor(Direction::South), ChunkCoord::new(5, 6));
        assert_eq!(c.neighbor(Direction::West), ChunkCoord::new(4, 5));
        assert_eq!(c.neighbor(Direction::North), ChunkCoord::new(5, 4));

        for dir in Direction::ALL {
            assert_eq!(c.neighbor(dir).neighbor(dir.opposite()), c);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ChunkCoord::new(-3, 7).to_string(), "(-3, 7)");
    }
}
